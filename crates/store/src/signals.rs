use chrono::Utc;
use sqlx::FromRow;
use tracing::warn;

use common::{Result, Side, Signal, SignalStatus, SignalUpdate};

use crate::Store;

#[derive(FromRow)]
struct SignalRow {
    id: String,
    pair: String,
    #[sqlx(rename = "type")]
    side: Side,
    entry_price: f64,
    take_profit_levels: String,
    stop_loss: f64,
    status: SignalStatus,
    tp_hit: bool,
    sl_hit: bool,
    current_price: Option<f64>,
    pnl: Option<f64>,
}

impl SignalRow {
    fn into_signal(self) -> Result<Signal, serde_json::Error> {
        let take_profit_levels: Vec<f64> = serde_json::from_str(&self.take_profit_levels)?;
        Ok(Signal {
            id: self.id,
            pair: self.pair,
            side: self.side,
            entry_price: self.entry_price,
            take_profit_levels,
            stop_loss: self.stop_loss,
            status: self.status,
            tp_hit: self.tp_hit,
            sl_hit: self.sl_hit,
            current_price: self.current_price,
            pnl: self.pnl,
        })
    }
}

impl Store {
    /// All non-terminal signals. Rows with an unreadable take-profit column
    /// are logged and skipped rather than failing the batch.
    pub async fn open_signals(&self) -> Result<Vec<Signal>> {
        let rows: Vec<SignalRow> = sqlx::query_as(
            r#"
            SELECT id, pair, type, entry_price, take_profit_levels, stop_loss,
                   status, tp_hit, sl_hit, current_price, pnl
            FROM signals
            WHERE status IN ('pending', 'active')
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut signals = Vec::with_capacity(rows.len());
        for row in rows {
            let id = row.id.clone();
            match row.into_signal() {
                Ok(signal) => signals.push(signal),
                Err(e) => warn!(signal = %id, error = %e, "Unreadable take-profit levels, skipping signal"),
            }
        }
        Ok(signals)
    }

    /// Write one evaluation result back to its signal row.
    pub async fn apply_signal_update(&self, id: &str, update: &SignalUpdate) -> Result<()> {
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE signals
            SET current_price = ?1, status = ?2, tp_hit = ?3, sl_hit = ?4,
                pnl = ?5, updated_at = ?6
            WHERE id = ?7
            "#,
        )
        .bind(update.current_price)
        .bind(update.status)
        .bind(update.tp_hit)
        .bind(update.sl_hit)
        .bind(update.pnl)
        .bind(&updated_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
