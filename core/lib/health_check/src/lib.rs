//! Component health checks, modeled on the `CheckHealth`/`ReactiveHealthCheck`
//! pattern used by the consistency checker in the wider codebase: each
//! collaborator reports a `Health` on demand, and an aggregator folds
//! them into one overall status for the `/health` endpoint.

use async_trait::async_trait;
use enserver_db::DbPool;
use enserver_object_store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ready,
    Affected,
    NotReady,
}

#[derive(Debug, Clone)]
pub struct Health {
    pub status: HealthStatus,
    pub details: Option<serde_json::Value>,
}

impl Health {
    pub fn ready() -> Self {
        Self {
            status: HealthStatus::Ready,
            details: None,
        }
    }

    pub fn not_ready(details: impl Into<serde_json::Value>) -> Self {
        Self {
            status: HealthStatus::NotReady,
            details: Some(details.into()),
        }
    }
}

#[async_trait]
pub trait CheckHealth: Send + Sync {
    fn name(&self) -> &'static str;
    async fn check_health(&self) -> Health;
}

#[async_trait]
impl CheckHealth for DbPool {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn check_health(&self) -> Health {
        match sqlx::query("SELECT 1").execute(self.raw()).await {
            Ok(_) => Health::ready(),
            Err(err) => Health::not_ready(err.to_string()),
        }
    }
}

/// Wraps an [`ObjectStore`] so it can be registered alongside other
/// [`CheckHealth`] components; probes readiness with a lookup for a
/// sentinel object that is never expected to exist.
pub struct ObjectStoreHealthCheck {
    store: std::sync::Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStoreHealthCheck {
    pub fn new(store: std::sync::Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl CheckHealth for ObjectStoreHealthCheck {
    fn name(&self) -> &'static str {
        "object_store"
    }

    async fn check_health(&self) -> Health {
        match self.store.exists(&self.bucket, "__health_check_sentinel__").await {
            Ok(_) => Health::ready(),
            Err(err) => Health::not_ready(err.to_string()),
        }
    }
}

/// Aggregates every registered [`CheckHealth`] into a single worst-of
/// status, the way the `/health` endpoint reports overall readiness.
pub struct AppHealthCheck {
    checks: Vec<Box<dyn CheckHealth>>,
}

impl AppHealthCheck {
    pub fn new(checks: Vec<Box<dyn CheckHealth>>) -> Self {
        Self { checks }
    }

    pub async fn check_all(&self) -> (HealthStatus, serde_json::Value) {
        let mut overall = HealthStatus::Ready;
        let mut components = serde_json::Map::new();
        for check in &self.checks {
            let health = check.check_health().await;
            if worse(health.status, overall) {
                overall = health.status;
            }
            components.insert(
                check.name().to_string(),
                serde_json::json!({
                    "status": format!("{:?}", health.status),
                    "details": health.details,
                }),
            );
        }
        (overall, serde_json::Value::Object(components))
    }
}

fn worse(a: HealthStatus, b: HealthStatus) -> bool {
    rank(a) > rank(b)
}

fn rank(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Ready => 0,
        HealthStatus::Affected => 1,
        HealthStatus::NotReady => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysReady;

    #[async_trait]
    impl CheckHealth for AlwaysReady {
        fn name(&self) -> &'static str {
            "always_ready"
        }

        async fn check_health(&self) -> Health {
            Health::ready()
        }
    }

    struct AlwaysDown;

    #[async_trait]
    impl CheckHealth for AlwaysDown {
        fn name(&self) -> &'static str {
            "always_down"
        }

        async fn check_health(&self) -> Health {
            Health::not_ready("down for maintenance")
        }
    }

    #[tokio::test]
    async fn aggregates_to_worst_status() {
        let app = AppHealthCheck::new(vec![Box::new(AlwaysReady), Box::new(AlwaysDown)]);
        let (status, _) = app.check_all().await;
        assert_eq!(status, HealthStatus::NotReady);
    }

    #[tokio::test]
    async fn all_ready_reports_ready() {
        let app = AppHealthCheck::new(vec![Box::new(AlwaysReady)]);
        let (status, _) = app.check_all().await;
        assert_eq!(status, HealthStatus::Ready);
    }
}
