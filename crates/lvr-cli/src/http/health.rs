use axum::{Router, routing::get};

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

#[tracing::instrument]
async fn health() -> &'static str {
    tracing::trace!("health check requested");
    "healthy"
}
