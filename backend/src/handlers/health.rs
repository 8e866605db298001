//! Service banner and health check

use axum::{extract::State, Json};
use serde::Serialize;

use crate::db;
use crate::state::AppState;
use crate::validation::RULESET_VERSION;

pub async fn root() -> &'static str {
    "Loanbook API Server"
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
    pub rules_version: u32,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = db::check_health(&state.db_pool).await;
    let status = if database.is_connected() {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        database: database.describe(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rules_version: RULESET_VERSION,
    })
}
