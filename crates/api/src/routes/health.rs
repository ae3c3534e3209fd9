use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use common::SystemHealth;

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Health check endpoint — no auth required.
/// Status degrades as the persisted snapshots go stale.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let ages = state.ctx.store.update_ages().await.unwrap_or_default();
    let health = SystemHealth::from_ages(ages.price_minutes, ages.indicator_minutes);

    Json(json!({
        "status": health.to_string(),
        "last_price_update": ages.last_price_update,
        "last_indicator_update": ages.last_indicator_update,
    }))
}
