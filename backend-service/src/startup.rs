//! Application startup and lifecycle management.

use crate::config::BackendConfig;
use crate::handlers::{
    backend::backend, health::healthcheck, metrics::metrics_handler, notification::notification,
};
use crate::services::{Database, NotificationStore};
use axum::{middleware::from_fn, routing::any, Router};
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone, Default)]
pub struct AppState {
    /// Absent when no database is configured or the connection failed at startup.
    pub store: Option<Arc<dyn NotificationStore>>,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn NotificationStore>>) -> Self {
        Self { store }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/backend", any(backend))
        .route("/notification", any(notification))
        .route("/healthcheck", any(healthcheck))
        .route("/metrics", any(metrics_handler))
        .route_layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Connect to the notification store if one is configured.
///
/// Any failure is logged and leaves the service running without a store.
async fn connect_store(config: &BackendConfig) -> Option<Arc<dyn NotificationStore>> {
    let Some(db_config) = config.database.as_ref() else {
        tracing::info!("DB_HOST not set, running without database");
        return None;
    };

    match Database::connect(db_config).await {
        Ok(db) => {
            tracing::info!("Connected to database");
            Some(Arc::new(db))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to connect database, running without it");
            None
        }
    }
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: BackendConfig) -> Result<Self, AppError> {
        let store = connect_store(&config).await;
        Self::build_with_state(config, AppState::new(store)).await
    }

    /// Build the application around an existing state, skipping the database connection.
    pub async fn build_with_state(config: BackendConfig, state: AppState) -> Result<Self, AppError> {
        // Port 0 picks a random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Starting server on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the application until `shutdown` resolves, letting in-flight requests finish.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);

        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
    }
}
