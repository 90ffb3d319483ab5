pub mod backend;
pub mod health;
pub mod metrics;
pub mod notification;

use crate::models::{json, ResponseEnvelope};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

/// Encode an envelope as the JSON response body, using `status` for both the
/// HTTP status line and the envelope's `Status` field.
pub fn envelope_response(
    status: StatusCode,
    message: impl Into<String>,
) -> Result<Response, AppError> {
    let envelope = ResponseEnvelope::new(status.as_u16(), message);
    let body = json::to_vec(&envelope)?;

    Ok((status, [(header::CONTENT_TYPE, "application/json")], body).into_response())
}
