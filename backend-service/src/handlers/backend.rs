use super::envelope_response;
use axum::{
    extract::ConnectInfo,
    http::{header, HeaderMap, Method, StatusCode},
    response::Response,
};
use service_core::error::AppError;
use std::net::SocketAddr;

const GREETING_NAME: &str = "backend";

pub async fn backend(
    method: Method,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
) -> Result<Response, AppError> {
    tracing::info!(
        method = %method,
        remote_addr = ?connect_info.map(|ConnectInfo(addr)| addr),
        referer = headers.get(header::REFERER).and_then(|v| v.to_str().ok()).unwrap_or(""),
        "Received /backend request"
    );

    let response = envelope_response(StatusCode::OK, format!("Hello World, {}!", GREETING_NAME))?;

    tracing::info!("/backend response sent");
    Ok(response)
}
