//! Health check handler.

use axum::{routing::get, Router};

/// Fixed response body of `GET /`.
pub const HEALTH_BODY: &str = "WATI AutoBot running successfully!";

/// Always 200, whatever state the bot is in.
async fn health() -> &'static str {
    HEALTH_BODY
}

pub fn create_router() -> Router {
    Router::new().route("/", get(health))
}
