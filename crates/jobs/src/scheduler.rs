use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::{indicators, signals, JobContext};

/// Drive the signals job on a fixed interval. The first tick fires
/// immediately on startup; a failed tick is logged and the loop keeps
/// going. Call from `tokio::spawn`.
pub async fn signals_loop(ctx: JobContext, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match signals::run(&ctx).await {
            Ok(outcome) => info!(
                prices = outcome.prices_updated,
                transitions = outcome.transitions,
                "Scheduled signal update completed"
            ),
            Err(e) => error!(error = %e, "Scheduled signal update failed"),
        }
    }
}

/// Drive the indicators job on a fixed interval. Same loop semantics as
/// `signals_loop`.
pub async fn indicators_loop(ctx: JobContext, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match indicators::run(&ctx).await {
            Ok(outcome) => info!(
                updated = outcome.indicators_updated,
                "Scheduled indicator update completed"
            ),
            Err(e) => error!(error = %e, "Scheduled indicator update failed"),
        }
    }
}
