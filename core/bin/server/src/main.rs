//! Wires one instance of every node crate together and binds the HTTP
//! and gRPC surfaces. Loading configuration from the environment, CLI
//! flags, or a file is explicitly out of scope (spec §1) — the values
//! below stand in for whatever a real deployment's config loader would
//! supply.

use std::sync::Arc;
use std::time::Duration;

use enserver_api::{build_router, ApiDependencies, HealthState};
use enserver_authorized_apps::AuthorizedAppRegistry;
use enserver_config::{
    CleanupConfig, ExportSchedulerConfig, ExportWorkerConfig, FederationConfig, KeyRotationConfig,
    PublishConfig, RevisionTokenConfig,
};
use enserver_db::DbPool;
use enserver_health_check::AppHealthCheck;
use enserver_export_worker::InMemorySigningKeyProvider;
use enserver_federation::{FederationInState, FederationServer, FederationService};
use enserver_key_rotation::InMemoryKeyMaterialSource;
use enserver_object_store::InMemoryObjectStore;
use enserver_publish::PublishState;
use enserver_revision_token::DbRevisionKeyProvider;
use enserver_verification::ClockSkew;

const DATABASE_URL_PLACEHOLDER: &str = "postgres://localhost/enserver";
const HTTP_ADDR: &str = "0.0.0.0:8080";
const GRPC_ADDR: &str = "0.0.0.0:8443";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let pool = DbPool::connect(DATABASE_URL_PLACEHOLDER, 10).await?;
    let object_store: Arc<dyn enserver_object_store::ObjectStore> = Arc::new(InMemoryObjectStore::new());

    let deps = ApiDependencies {
        publish: PublishState {
            pool: pool.clone(),
            apps: Arc::new(AuthorizedAppRegistry::new(pool.clone(), Duration::from_secs(300), 10_000)),
            revision_keys: Arc::new(DbRevisionKeyProvider::new(pool.clone())),
            revision_token_config: RevisionTokenConfig::default(),
            publish_config: PublishConfig::default(),
            verification_skew: ClockSkew::default(),
        },
        export_scheduler: enserver_export_scheduler::SchedulerState {
            pool: pool.clone(),
            config: ExportSchedulerConfig::default(),
        },
        export_worker: enserver_export_worker::WorkerState {
            pool: pool.clone(),
            object_store: object_store.clone(),
            signing_keys: Arc::new(InMemorySigningKeyProvider::new()),
            config: ExportWorkerConfig::default(),
        },
        cleanup: enserver_cleanup::CleanupState {
            pool: pool.clone(),
            object_store: object_store.clone(),
            config: CleanupConfig::default(),
        },
        key_rotation: enserver_key_rotation::KeyRotationState {
            pool: pool.clone(),
            key_source: Arc::new(InMemoryKeyMaterialSource),
            config: KeyRotationConfig::default(),
        },
        federation_in: FederationInState {
            pool: pool.clone(),
            // Partner discovery is a configuration-loading concern (out of
            // scope); a real deployment supplies this list at wiring time.
            partners: Arc::new(Vec::new()),
            rpc_timeout: FederationConfig::default().rpc_timeout,
        },
        health: HealthState(Arc::new(AppHealthCheck::new(vec![
            Box::new(pool.clone()),
            Box::new(enserver_health_check::ObjectStoreHealthCheck::new(
                object_store.clone(),
                "health",
            )),
        ]))),
    };

    let federation_config = FederationConfig::default();
    let federation_service = FederationServer::new(FederationService::new(pool, federation_config.max_records_per_call));

    let http = tokio::spawn(async move {
        let router = build_router(deps);
        let listener = tokio::net::TcpListener::bind(HTTP_ADDR).await?;
        axum::serve(listener, router).await?;
        Ok::<(), anyhow::Error>(())
    });

    let grpc = tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(federation_service)
            .serve(GRPC_ADDR.parse()?)
            .await?;
        Ok::<(), anyhow::Error>(())
    });

    tokio::select! {
        res = http => res??,
        res = grpc => res??,
    }

    Ok(())
}
