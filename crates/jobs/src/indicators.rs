use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};

use common::{Error, IndicatorKind, IndicatorReading, Result};
use indicators::readings_for;

use crate::JobContext;

/// Summary of one indicators invocation.
#[derive(Debug, Serialize)]
pub struct IndicatorsOutcome {
    pub indicators_updated: usize,
    pub readings: Vec<IndicatorReading>,
    /// Row writes that failed or matched no row; the batch keeps going.
    pub write_errors: usize,
}

/// Fetch the three indicator batches, classify, and overwrite the stored
/// readings. The fetches are independent reads and run concurrently; one
/// failing leaves the other families intact.
pub async fn run(ctx: &JobContext) -> Result<IndicatorsOutcome> {
    info!("Starting technical indicators update");

    let config = ctx.store.runtime_config().await?;

    let (atr, rsi, macd) = tokio::join!(
        ctx.source
            .indicator_values(&config.api_key, IndicatorKind::Atr, &config.pairs),
        ctx.source
            .indicator_values(&config.api_key, IndicatorKind::Rsi, &config.pairs),
        ctx.source
            .indicator_values(&config.api_key, IndicatorKind::Macd, &config.pairs),
    );

    // ATR is classified relative to the freshly persisted prices.
    let prices = ctx.store.market_prices().await?;

    let mut readings = Vec::new();
    readings.extend(readings_for(
        IndicatorKind::Atr,
        &atr.unwrap_or_default(),
        &config.pairs,
        &prices,
    ));
    readings.extend(readings_for(
        IndicatorKind::Rsi,
        &rsi.unwrap_or_default(),
        &config.pairs,
        &prices,
    ));
    readings.extend(readings_for(
        IndicatorKind::Macd,
        &macd.unwrap_or_default(),
        &config.pairs,
        &prices,
    ));

    if readings.is_empty() {
        return Err(Error::Provider(
            "no indicator data was successfully fetched".into(),
        ));
    }

    let mut write_errors = 0usize;
    for reading in &readings {
        match ctx.store.update_indicator(reading).await {
            Ok(0) => write_errors += 1, // no seeded row — logged by the store
            Ok(_) => {}
            Err(e) => {
                error!(
                    pair = %reading.pair,
                    indicator = %reading.indicator,
                    error = %e,
                    "Failed to update indicator"
                );
                write_errors += 1;
            }
        }
    }

    if let Err(e) = ctx.store.touch_config("last_indicator_update").await {
        error!(error = %e, "Failed to stamp last_indicator_update");
    }

    let outcome = IndicatorsOutcome {
        indicators_updated: readings.len(),
        readings,
        write_errors,
    };
    info!(
        updated = outcome.indicators_updated,
        write_errors = outcome.write_errors,
        "Indicator update completed"
    );
    Ok(outcome)
}

/// Response body for a successful invocation, shared by the direct endpoint
/// and the manual-trigger fan-out.
pub fn success_body(outcome: &IndicatorsOutcome) -> Value {
    json!({
        "success": true,
        "message": "Technical indicators updated successfully",
        "indicators_updated": outcome.indicators_updated,
        "timestamp": Utc::now().to_rfc3339(),
        "indicators": outcome.readings,
    })
}
