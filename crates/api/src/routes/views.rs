use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};
use sqlx::FromRow;

use crate::AppState;

/// Read-only views over the persisted state, for dashboards and debugging.
pub fn views_router() -> Router<AppState> {
    Router::new()
        .route("/api/signals", get(get_signals))
        .route("/api/prices", get(get_prices))
        .route("/api/indicators", get(get_indicators))
}

// ─── Signals ──────────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct SignalViewRow {
    id: String,
    pair: String,
    #[sqlx(rename = "type")]
    side: String,
    entry_price: f64,
    take_profit_levels: String,
    stop_loss: f64,
    status: String,
    tp_hit: bool,
    sl_hit: bool,
    current_price: Option<f64>,
    pnl: Option<f64>,
    updated_at: Option<String>,
}

async fn get_signals(State(state): State<AppState>) -> Json<Value> {
    let rows: Vec<SignalViewRow> = sqlx::query_as(
        r#"
        SELECT id, pair, type, entry_price, take_profit_levels, stop_loss,
               status, tp_hit, sl_hit, current_price, pnl, updated_at
        FROM signals ORDER BY updated_at DESC
        "#,
    )
    .fetch_all(state.ctx.store.pool())
    .await
    .unwrap_or_default();

    let signals: Vec<Value> = rows
        .iter()
        .map(|s| {
            let levels: Vec<f64> =
                serde_json::from_str(&s.take_profit_levels).unwrap_or_default();
            json!({
                "id": s.id,
                "pair": s.pair,
                "type": s.side,
                "entry_price": s.entry_price,
                "take_profit_levels": levels,
                "stop_loss": s.stop_loss,
                "status": s.status,
                "tp_hit": s.tp_hit,
                "sl_hit": s.sl_hit,
                "current_price": s.current_price,
                "pnl": s.pnl,
                "updated_at": s.updated_at,
            })
        })
        .collect();

    Json(json!({ "signals": signals, "total": signals.len() }))
}

// ─── Prices ───────────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct PriceViewRow {
    pair: String,
    current_price: Option<f64>,
    high_price: Option<f64>,
    low_price: Option<f64>,
    open_price: Option<f64>,
    volume: Option<String>,
    change_amount: Option<f64>,
    change_percent: Option<f64>,
    updated_at: Option<String>,
}

async fn get_prices(State(state): State<AppState>) -> Json<Value> {
    let rows: Vec<PriceViewRow> = sqlx::query_as(
        r#"
        SELECT pair, current_price, high_price, low_price, open_price,
               volume, change_amount, change_percent, updated_at
        FROM price_summary ORDER BY updated_at DESC
        "#,
    )
    .fetch_all(state.ctx.store.pool())
    .await
    .unwrap_or_default();

    let prices: Vec<Value> = rows
        .iter()
        .map(|p| {
            json!({
                "pair": p.pair,
                "current_price": p.current_price,
                "high_price": p.high_price,
                "low_price": p.low_price,
                "open_price": p.open_price,
                "volume": p.volume,
                "change_amount": p.change_amount,
                "change_percent": p.change_percent,
                "updated_at": p.updated_at,
            })
        })
        .collect();

    Json(json!({ "prices": prices, "total": prices.len() }))
}

// ─── Indicators ───────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct IndicatorViewRow {
    pair: String,
    indicator_name: String,
    value: Option<String>,
    status: Option<String>,
    color: Option<String>,
    timeframe: Option<String>,
    updated_at: Option<String>,
}

async fn get_indicators(State(state): State<AppState>) -> Json<Value> {
    let rows: Vec<IndicatorViewRow> = sqlx::query_as(
        r#"
        SELECT pair, indicator_name, value, status, color, timeframe, updated_at
        FROM technical_indicators ORDER BY pair, indicator_name
        "#,
    )
    .fetch_all(state.ctx.store.pool())
    .await
    .unwrap_or_default();

    let indicators: Vec<Value> = rows
        .iter()
        .map(|i| {
            json!({
                "pair": i.pair,
                "indicator_name": i.indicator_name,
                "value": i.value,
                "status": i.status,
                "color": i.color,
                "timeframe": i.timeframe,
                "updated_at": i.updated_at,
            })
        })
        .collect();

    Json(json!({ "indicators": indicators, "total": indicators.len() }))
}
