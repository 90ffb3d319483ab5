//! Data access for notifications.

use crate::config::{DatabaseConfig, DB_CONNECT_TIMEOUT};
use crate::models::Notification;
use crate::services::metrics::record_lookup;
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{debug, info, instrument, warn};

/// Read-only access to stored notifications.
///
/// Implementors provide the fallible lookup; callers use
/// [`NotificationStore::get_notification`], which never fails.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Fetch one notification by primary key.
    ///
    /// A missing row is `AppError::NotFound`.
    async fn fetch_notification(&self, id: &str) -> Result<Notification, AppError>;

    /// Look up a notification, substituting a placeholder record on any failure.
    async fn get_notification(&self, id: &str) -> Notification {
        match self.fetch_notification(id).await {
            Ok(notification) => {
                record_lookup("found");
                notification
            }
            Err(AppError::NotFound(e)) => {
                debug!(id = %id, error = %e, "Notification not found");
                record_lookup("not_found");
                Notification::placeholder(id)
            }
            Err(e) => {
                warn!(id = %id, error = %e, "Notification lookup failed");
                record_lookup("error");
                Notification::placeholder(id)
            }
        }
    }
}

/// PostgreSQL-backed notification store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Open a pool and verify one connection can be established.
    #[instrument(skip(config), fields(host = %config.host, database = %config.name))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        Self::connect_with(config.connect_options()?).await
    }

    /// Open a pool from explicit connection options.
    pub async fn connect_with(options: PgConnectOptions) -> Result<Self, AppError> {
        info!("Connecting to PostgreSQL");

        let pool = PgPoolOptions::new()
            .acquire_timeout(DB_CONNECT_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl NotificationStore for Database {
    #[instrument(skip(self))]
    async fn fetch_notification(&self, id: &str) -> Result<Notification, AppError> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notification WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to fetch notification: {}", e))
            })?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Notification '{}' not found", id)))
    }
}
