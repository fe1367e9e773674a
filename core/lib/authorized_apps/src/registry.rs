use std::sync::Arc;
use std::time::Duration as StdDuration;

use enserver_db::{AuthorizedAppDal, DbPool};
use enserver_types::AuthorizedApp;
use mini_moka::sync::Cache;

use crate::error::{AuthorizedAppError, Result};

/// Policy registry for mobile-app publish access (C4). Backed by
/// `authorized_app` (C2) through a bounded cache with expiry-only
/// invalidation (spec §5: "Cache entries ... have TTLs; invalidation is
/// by expiry only").
pub struct AuthorizedAppRegistry {
    pool: DbPool,
    cache: Cache<String, Arc<AuthorizedApp>>,
}

impl AuthorizedAppRegistry {
    pub fn new(pool: DbPool, ttl: StdDuration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { pool, cache }
    }

    /// Fetches the app's policy, consulting the cache first. Spec §4.3
    /// step 1: "Fail `AppNotAuthorized` if absent."
    pub async fn require(&self, app_package_name: &str) -> Result<Arc<AuthorizedApp>> {
        self.get(app_package_name)
            .await?
            .ok_or(AuthorizedAppError::NotAuthorized)
    }

    pub async fn get(&self, app_package_name: &str) -> Result<Option<Arc<AuthorizedApp>>> {
        if let Some(hit) = self.cache.get(&app_package_name.to_string()) {
            return Ok(Some(hit));
        }

        let mut conn = self.pool.raw().acquire().await.map_err(enserver_db::DbError::from)?;
        let mut dal = AuthorizedAppDal { conn: &mut conn };
        let app = dal.find(app_package_name).await?;

        Ok(match app {
            Some(app) => {
                let app = Arc::new(app);
                self.cache.insert(app_package_name.to_string(), app.clone());
                Some(app)
            }
            None => None,
        })
    }

    /// Drops every cached entry immediately; used by tests and by the
    /// rare operator-triggered config reload. Normal invalidation is
    /// expiry-only, per spec §5.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}
