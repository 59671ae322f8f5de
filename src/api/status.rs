//! Status Routes
//!
//! Routes:
//! - GET /health - Basic health check

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Build status routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Basic health check.
///
/// GET /health
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
