use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{DbError, Result};

/// Thin wrapper around `sqlx::PgPool`, mirroring the teacher's
/// `PoolResource`/connection-pool facade (`core/node/node_framework/src/
/// implementations/resources/pools.rs`): the rest of the crate never
/// touches `sqlx::PgPool` directly, only through this handle.
#[derive(Debug, Clone)]
pub struct DbPool {
    pool: PgPool,
}

impl DbPool {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn raw(&self) -> &PgPool {
        &self.pool
    }

    /// Starts a new transaction. Spec §5: "Publish is serialized per
    /// submitted key set via a ... DB transaction"; every write path in
    /// this crate runs inside one of these.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(DbError::from)
    }
}
