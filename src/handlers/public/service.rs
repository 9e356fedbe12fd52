use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
    }))
}

/// GET /health - 503 when the store does not answer
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.health.ping().await.map_err(|e| {
        tracing::error!("Health check failed: {}", e);
        ApiError::service_unavailable("Database temporarily unavailable")
    })?;
    Ok(Json(json!({ "status": "ok" })))
}
