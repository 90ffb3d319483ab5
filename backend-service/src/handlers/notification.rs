use super::envelope_response;
use crate::models::json;
use crate::startup::AppState;
use axum::{
    body::to_bytes,
    extract::{ConnectInfo, FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
};
use service_core::error::AppError;
use std::net::SocketAddr;

pub const DATABASE_UNAVAILABLE: &str = "Database connection not available";
pub const NO_MESSAGE: &str = "no message";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";

/// Largest urlencoded body read for form values. Bigger bodies are ignored.
pub const MAX_FORM_BODY: usize = 10 << 20;

/// Look up a notification by the `id` form/query parameter.
///
/// The record is JSON-encoded and carried as the envelope's message string.
pub async fn notification(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> Result<Response, AppError> {
    tracing::info!(
        method = %request.method(),
        remote_addr = ?connect_info.map(|ConnectInfo(addr)| addr),
        referer = request
            .headers()
            .get(header::REFERER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(""),
        "Received /notification request"
    );

    let id = form_value(request, "id").await.unwrap_or_default();
    tracing::info!(id = %id, "Request parameter");

    let Some(store) = state.store.as_ref() else {
        tracing::error!("Database connection not available");
        return envelope_response(StatusCode::SERVICE_UNAVAILABLE, DATABASE_UNAVAILABLE);
    };

    let message = if id.is_empty() {
        tracing::info!("No id parameter provided, returning default message");
        NO_MESSAGE.to_string()
    } else {
        tracing::info!(id = %id, "Fetching notification");
        let notification = store.get_notification(&id).await;
        let encoded = json::to_string(&notification)?;
        tracing::info!(notification = %encoded, "Fetched notification");
        encoded
    };

    let response = envelope_response(StatusCode::OK, message)?;
    tracing::info!("/notification response sent");
    Ok(response)
}

/// First value of `key` in the request's form data.
///
/// Lookup order: a urlencoded POST, PUT or PATCH body, then the query
/// string, then non-file fields of a multipart body. The body is only read
/// when its content type is a form; unreadable or oversized bodies yield
/// no value rather than an error.
pub async fn form_value(request: Request, key: &str) -> Option<String> {
    let content_type = media_type(request.headers());

    if has_urlencoded_body(request.method(), content_type.as_deref()) {
        let query = request.uri().query().map(str::to_string);
        let body = to_bytes(request.into_body(), MAX_FORM_BODY).await.ok();
        return body
            .and_then(|b| first_value(&b, key))
            .or_else(|| query.and_then(|q| first_value(q.as_bytes(), key)));
    }

    if let Some(value) = request.uri().query().and_then(|q| first_value(q.as_bytes(), key)) {
        return Some(value);
    }

    if content_type.as_deref() == Some(MULTIPART_CONTENT_TYPE) {
        return multipart_value(request, key).await;
    }

    None
}

/// Lower-cased media type without parameters.
fn media_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase())
}

fn has_urlencoded_body(method: &Method, content_type: Option<&str>) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
        && content_type == Some(FORM_CONTENT_TYPE)
}

fn first_value(encoded: &[u8], key: &str) -> Option<String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(encoded)
        .ok()?
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

async fn multipart_value(request: Request, key: &str) -> Option<String> {
    let mut multipart = Multipart::from_request(request, &()).await.ok()?;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some(key) && field.file_name().is_none() {
            return field.text().await.ok();
        }
    }

    None
}
