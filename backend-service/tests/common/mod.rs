//! Common test utilities for backend-service integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use backend_service::config::BackendConfig;
use backend_service::models::Notification;
use backend_service::services::{Database, NotificationStore};
use backend_service::startup::{build_router, AppState, Application};
use http_body_util::BodyExt;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use sqlx::postgres::PgConnectOptions;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Once};
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,backend_service=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// In-memory notification table.
#[derive(Default)]
pub struct InMemoryStore {
    rows: HashMap<String, Notification>,
}

impl InMemoryStore {
    pub fn with(rows: impl IntoIterator<Item = Notification>) -> Self {
        Self {
            rows: rows.into_iter().map(|n| (n.id.clone(), n)).collect(),
        }
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn fetch_notification(&self, id: &str) -> Result<Notification, AppError> {
        self.rows
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Notification '{}' not found", id)))
    }
}

/// Store whose every query fails, like a dropped connection.
pub struct UnreachableStore;

#[async_trait]
impl NotificationStore for UnreachableStore {
    async fn fetch_notification(&self, _id: &str) -> Result<Notification, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!(
            "pool timed out while waiting for an open connection"
        )))
    }
}

pub fn sample_notification(id: &str) -> Notification {
    Notification {
        id: id.to_string(),
        created_at: "2024-04-01T09:00:00+09:00".to_string(),
        updated_at: "2024-04-01T09:05:00+09:00".to_string(),
        is_read: false,
        is_deleted: false,
        verification: true,
        email: "user@example.com".to_string(),
        body: "Your verification code is 123456".to_string(),
    }
}

pub fn router_with_store(store: impl NotificationStore + 'static) -> Router {
    init_tracing();
    build_router(AppState::new(Some(Arc::new(store))))
}

pub fn router_without_store() -> Router {
    init_tracing();
    build_router(AppState::default())
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub request_id: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Response body is not JSON")
    }
}

/// Drive one request through the router.
pub async fn send(router: Router, request: Request<Body>) -> TestResponse {
    let response = router
        .oneshot(request)
        .await
        .expect("Router failed to respond");

    let status = response.status();
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let content_type = header("content-type");
    let request_id = header("x-request-id");

    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();

    TestResponse {
        status,
        content_type,
        request_id,
        body: String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8"),
    }
}

pub async fn get(router: Router, uri: &str) -> TestResponse {
    send(
        router,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

pub fn test_config() -> BackendConfig {
    BackendConfig {
        common: CoreConfig { port: 0 },
        service_name: "backend-service-test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: None,
    }
}

/// A running server bound to a random port.
pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Spawn the application with no database configured.
    pub async fn spawn() -> Self {
        init_tracing();

        let app = Application::build(test_config())
            .await
            .expect("Failed to build test application");
        Self::start(app).await
    }

    /// Spawn the application around a prepared state.
    pub async fn spawn_with_state(state: AppState) -> Self {
        init_tracing();

        let app = Application::build_with_state(test_config(), state)
            .await
            .expect("Failed to build test application");
        Self::start(app).await
    }

    async fn start(app: Application) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/healthcheck", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}

/// A database in a schema of its own, holding an empty `notification` table.
pub struct TestDatabase {
    pub db: Database,
    pub schema: String,
}

impl TestDatabase {
    /// Connect via `TEST_DATABASE_URL` and create an isolated schema.
    pub async fn create() -> Self {
        init_tracing();

        let database_url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set to run database tests");
        let schema = format!("notification_test_{}", uuid::Uuid::new_v4().simple());

        let base = PgConnectOptions::from_str(&database_url).expect("Invalid TEST_DATABASE_URL");
        let admin = Database::connect_with(base.clone())
            .await
            .expect("Failed to connect to test database");
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(admin.pool())
            .await
            .expect("Failed to create schema");

        let db = Database::connect_with(base.options([
            ("search_path", schema.as_str()),
            ("TimeZone", "Asia/Tokyo"),
        ]))
        .await
        .expect("Failed to connect to test schema");

        sqlx::query(
            r#"
            CREATE TABLE notification (
                id TEXT PRIMARY KEY,
                created_at TIMESTAMPTZ,
                updated_at TIMESTAMPTZ,
                is_read BOOLEAN,
                is_deleted BOOLEAN,
                verification BOOLEAN,
                email TEXT,
                body TEXT
            )
            "#,
        )
        .execute(db.pool())
        .await
        .expect("Failed to create notification table");

        Self { db, schema }
    }

    /// Insert a row; timestamps are SQL literals such as `2024-04-01 09:00:00+09`.
    pub async fn insert(
        &self,
        id: &str,
        created_at: &str,
        updated_at: &str,
        email: Option<&str>,
        body: &str,
    ) {
        sqlx::query(
            r#"
            INSERT INTO notification (id, created_at, updated_at, is_read, is_deleted, verification, email, body)
            VALUES ($1, $2::timestamptz, $3::timestamptz, false, false, true, $4, $5)
            "#,
        )
        .bind(id)
        .bind(created_at)
        .bind(updated_at)
        .bind(email)
        .bind(body)
        .execute(self.db.pool())
        .await
        .expect("Failed to insert notification");
    }

    pub async fn drop_schema(self) {
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(self.db.pool())
            .await
            .ok();
    }
}
