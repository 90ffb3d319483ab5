use axum::http::Method;

pub async fn healthcheck(method: Method) -> &'static str {
    tracing::debug!(method = %method, "Received /healthcheck request");
    "healthcheck OK"
}
