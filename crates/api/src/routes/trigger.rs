use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{auth::require_trigger_key, AppState};

pub fn trigger_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/update-signals", post(update_signals))
        .route_layer(middleware::from_fn_with_state(state, require_trigger_key));

    Router::new()
        .route("/update-indicators", post(update_indicators))
        .route("/manual-trigger", post(manual_trigger))
        .merge(protected)
}

fn error_body(message: &str, details: &common::Error) -> Value {
    json!({
        "error": message,
        "details": details.to_string(),
        "timestamp": Utc::now().to_rfc3339(),
    })
}

// ─── Signals ──────────────────────────────────────────────────────────────────

async fn update_signals(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match jobs::signals::run(&state.ctx).await {
        Ok(outcome) => (StatusCode::OK, Json(jobs::signals::success_body(&outcome))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_body("Failed to update signals", &e)),
        ),
    }
}

// ─── Indicators ───────────────────────────────────────────────────────────────

async fn update_indicators(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match jobs::indicators::run(&state.ctx).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(jobs::indicators::success_body(&outcome)),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(error_body("Failed to update technical indicators", &e)),
        ),
    }
}

// ─── Manual trigger ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct TriggerQuery {
    action: Option<String>,
}

/// Fans out to the steps above, in-process. 200 when every step that ran
/// succeeded, 207 on partial failure.
async fn manual_trigger(
    State(state): State<AppState>,
    Query(q): Query<TriggerQuery>,
) -> (StatusCode, Json<Value>) {
    let action = q.action.as_deref().unwrap_or("both");
    let outcome = jobs::trigger::run(&state.ctx, action).await;

    let status = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (
        status,
        Json(json!({
            "success": outcome.success,
            "message": format!("Manual trigger completed for: {action}"),
            "results": outcome.results,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}
