use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;

/// Middleware that enforces the shared-secret query key on externally
/// triggered routes. Schedulers call with `?key=<EDGE_SECRET_KEY>`; an
/// absent or mismatched key is rejected before any work happens.
pub async fn require_trigger_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .uri()
        .query()
        .and_then(|q| q.split('&').find_map(|kv| kv.strip_prefix("key=")));

    match provided {
        Some(key) if key == state.edge_secret => next.run(request).await,
        _ => (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Unauthorized" })),
        )
            .into_response(),
    }
}
