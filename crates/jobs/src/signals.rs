use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use common::{Error, PriceData, Result, Signal};
use evaluator::{Evaluation, Transition};

use crate::JobContext;

/// Summary of one signals invocation, returned to the trigger surface.
#[derive(Debug, Serialize)]
pub struct SignalsOutcome {
    pub prices_updated: usize,
    pub price_data: Vec<PriceData>,
    pub signals_evaluated: usize,
    pub transitions: usize,
    /// Row writes that failed and were skipped; the batch keeps going.
    pub write_errors: usize,
}

/// Fetch prices, refresh the per-pair snapshots, and walk all open signals.
///
/// A missing API key fails the invocation before any work; an empty quote
/// batch fails the step; everything below that degrades row by row.
pub async fn run(ctx: &JobContext) -> Result<SignalsOutcome> {
    info!("Starting signal update");

    let config = ctx.store.runtime_config().await?;
    info!(pairs = ?config.pairs, "Fetching prices");

    let price_data = ctx.source.latest_quotes(&config.api_key, &config.pairs).await;
    if price_data.is_empty() {
        return Err(Error::Provider("no price data received from provider".into()));
    }

    for price in &price_data {
        if let Err(e) = ctx.store.upsert_price_summary(price).await {
            error!(pair = %price.pair, error = %e, "Failed to update price summary");
        }
        if let Err(e) = ctx.store.upsert_market_data(price).await {
            error!(pair = %price.pair, error = %e, "Failed to update market data");
        }
    }

    let signals = ctx.store.open_signals().await?;
    info!(count = signals.len(), "Processing open signals");

    let evaluations = evaluator::evaluate_batch(&signals, &price_data);
    let by_id: HashMap<&str, &Signal> = signals.iter().map(|s| (s.id.as_str(), s)).collect();

    let mut transitions = 0usize;
    let mut write_errors = 0usize;
    for eval in &evaluations {
        if let Some(signal) = by_id.get(eval.signal_id.as_str()) {
            log_transitions(ctx, signal, eval);
        }
        transitions += eval.transitions.len();

        if let Err(e) = ctx.store.apply_signal_update(&eval.signal_id, &eval.update).await {
            error!(signal = %eval.signal_id, error = %e, "Failed to update signal");
            write_errors += 1;
        }
    }

    if let Err(e) = ctx.store.touch_config("last_price_update").await {
        error!(error = %e, "Failed to stamp last_price_update");
    }

    let outcome = SignalsOutcome {
        prices_updated: price_data.len(),
        signals_evaluated: signals.len(),
        transitions,
        write_errors,
        price_data,
    };
    info!(
        prices = outcome.prices_updated,
        evaluated = outcome.signals_evaluated,
        transitions = outcome.transitions,
        "Signal update completed"
    );
    Ok(outcome)
}

fn log_transitions(ctx: &JobContext, signal: &Signal, eval: &Evaluation) {
    for transition in &eval.transitions {
        let price = eval.update.current_price;
        let pips = ctx
            .pairs
            .pips_between(&signal.pair, signal.entry_price, price, signal.side);
        match transition {
            Transition::Activated => {
                info!(signal = %signal.id, pair = %signal.pair, price, "Signal activated")
            }
            Transition::TakeProfit { level } => {
                info!(
                    signal = %signal.id,
                    pair = %signal.pair,
                    side = %signal.side,
                    price,
                    level,
                    pips = ?pips,
                    "Take-profit hit, signal closed"
                )
            }
            Transition::StopLoss => {
                info!(
                    signal = %signal.id,
                    pair = %signal.pair,
                    side = %signal.side,
                    price,
                    pips = ?pips,
                    "Stop-loss hit, signal closed"
                )
            }
        }
    }
}

/// Response body for a successful invocation, shared by the direct endpoint
/// and the manual-trigger fan-out.
pub fn success_body(outcome: &SignalsOutcome) -> Value {
    json!({
        "success": true,
        "message": "Signals updated successfully",
        "prices_updated": outcome.prices_updated,
        "timestamp": Utc::now().to_rfc3339(),
        "price_data": outcome.price_data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{quote, seed_config, test_context, MockSource};

    async fn insert_signal(ctx: &JobContext, id: &str, status: &str) {
        sqlx::query(
            r#"
            INSERT INTO signals (id, pair, type, entry_price, take_profit_levels,
                                 stop_loss, status, tp_hit, sl_hit)
            VALUES (?1, 'XAU/USD', 'BUY', 2000.0, '[2010.0, 2020.0]', 1985.0, ?2, 0, 0)
            "#,
        )
        .bind(id)
        .bind(status)
        .execute(ctx.store.pool())
        .await
        .unwrap();
    }

    async fn seed_runtime(ctx: &JobContext) {
        seed_config(ctx, "api_key_twelvedata", "test-key").await;
        seed_config(ctx, "supported_pairs", "XAU/USD").await;
        seed_config(ctx, "last_price_update", "").await;
    }

    #[tokio::test]
    async fn closes_signal_and_refreshes_snapshots() {
        let ctx = test_context(MockSource {
            quotes: vec![quote("XAU/USD", 2012.0)],
            ..Default::default()
        })
        .await;
        seed_runtime(&ctx).await;
        insert_signal(&ctx, "s1", "active").await;

        let outcome = run(&ctx).await.unwrap();
        assert_eq!(outcome.prices_updated, 1);
        assert_eq!(outcome.signals_evaluated, 1);
        assert_eq!(outcome.transitions, 1);
        assert_eq!(outcome.write_errors, 0);

        let (status, tp_hit, pnl): (String, bool, f64) =
            sqlx::query_as("SELECT status, tp_hit, pnl FROM signals WHERE id = 's1'")
                .fetch_one(ctx.store.pool())
                .await
                .unwrap();
        assert_eq!(status, "closed");
        assert!(tp_hit);
        assert!((pnl - 1200.0).abs() < 1e-9);

        let summary_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM price_summary")
            .fetch_one(ctx.store.pool())
            .await
            .unwrap();
        assert_eq!(summary_rows, 1);

        let stamped: Option<String> = sqlx::query_scalar(
            "SELECT config_value FROM system_config WHERE config_key = 'last_price_update'",
        )
        .fetch_one(ctx.store.pool())
        .await
        .unwrap();
        assert!(!stamped.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rerun_on_same_prices_leaves_closed_signals_alone() {
        let ctx = test_context(MockSource {
            quotes: vec![quote("XAU/USD", 2012.0)],
            ..Default::default()
        })
        .await;
        seed_runtime(&ctx).await;
        insert_signal(&ctx, "s1", "active").await;

        run(&ctx).await.unwrap();
        let second = run(&ctx).await.unwrap();

        // The closed signal is out of the open set on the second pass.
        assert_eq!(second.signals_evaluated, 0);
        assert_eq!(second.transitions, 0);
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_work() {
        let ctx = test_context(MockSource {
            quotes: vec![quote("XAU/USD", 2012.0)],
            ..Default::default()
        })
        .await;
        seed_config(&ctx, "supported_pairs", "XAU/USD").await;
        insert_signal(&ctx, "s1", "active").await;

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let status: String = sqlx::query_scalar("SELECT status FROM signals WHERE id = 's1'")
            .fetch_one(ctx.store.pool())
            .await
            .unwrap();
        assert_eq!(status, "active");
    }

    #[tokio::test]
    async fn empty_quote_batch_fails_the_step() {
        let ctx = test_context(MockSource::default()).await;
        seed_runtime(&ctx).await;

        let err = run(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }

    #[tokio::test]
    async fn signals_without_a_tick_are_untouched() {
        let ctx = test_context(MockSource {
            quotes: vec![quote("BTC/USD", 60_000.0)],
            ..Default::default()
        })
        .await;
        seed_runtime(&ctx).await;
        insert_signal(&ctx, "s1", "pending").await;

        let outcome = run(&ctx).await.unwrap();
        assert_eq!(outcome.signals_evaluated, 1);
        assert_eq!(outcome.transitions, 0);

        let status: String = sqlx::query_scalar("SELECT status FROM signals WHERE id = 's1'")
            .fetch_one(ctx.store.pool())
            .await
            .unwrap();
        assert_eq!(status, "pending");
    }
}
