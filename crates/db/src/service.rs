//! [`DatabaseService`]: the pool as a registry-managed singleton.

use async_trait::async_trait;
use sqlx::PgPool;
use taskboard_core::lifecycle::{LifecycleError, Service};

/// Owns the connection pool for the life of the process.
///
/// Construction is cheap and offline (lazy pool); `initialize` verifies
/// connectivity and applies migrations, `destroy` closes every connection.
pub struct DatabaseService {
    pool: PgPool,
    migrate_on_start: bool,
}

impl DatabaseService {
    pub fn connect_lazy(database_url: &str) -> Result<Self, LifecycleError> {
        let pool = crate::create_lazy_pool(database_url).map_err(LifecycleError::service)?;
        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool (tests hand in the per-test pool).
    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            migrate_on_start: true,
        }
    }

    pub fn without_migrations(mut self) -> Self {
        self.migrate_on_start = false;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Service for DatabaseService {
    async fn initialize(&self) -> Result<(), LifecycleError> {
        crate::health_check(&self.pool)
            .await
            .map_err(|e| LifecycleError::service(format!("database unreachable: {e}")))?;
        tracing::info!("Database connected");

        if self.migrate_on_start {
            crate::run_migrations(&self.pool)
                .await
                .map_err(|e| LifecycleError::service(format!("migrations failed: {e}")))?;
            tracing::info!("Database migrations applied");
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), LifecycleError> {
        self.pool.close().await;
        tracing::info!("Database disconnected");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.pool.is_closed() && crate::health_check(&self.pool).await.is_ok()
    }
}
