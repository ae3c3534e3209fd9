use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Direction of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle state of a signal. `Closed` is terminal — a closed signal is
/// never mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum SignalStatus {
    Pending,
    Active,
    Closed,
}

impl std::fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalStatus::Pending => write!(f, "pending"),
            SignalStatus::Active => write!(f, "active"),
            SignalStatus::Closed => write!(f, "closed"),
        }
    }
}

/// A trading recommendation tracked through pending → active → closed.
///
/// Created externally (manual insert); only the evaluator mutates it, and
/// only while non-terminal. `take_profit_levels` is stored in scan order:
/// ascending for BUY, descending for SELL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: String,
    pub pair: String,
    #[serde(rename = "type")]
    pub side: Side,
    pub entry_price: f64,
    pub take_profit_levels: Vec<f64>,
    pub stop_loss: f64,
    pub status: SignalStatus,
    pub tp_hit: bool,
    pub sl_hit: bool,
    pub current_price: Option<f64>,
    pub pnl: Option<f64>,
}

/// Field set written back to a signal row after one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalUpdate {
    pub current_price: f64,
    pub status: SignalStatus,
    pub tp_hit: bool,
    pub sl_hit: bool,
    pub pnl: f64,
}

/// Latest OHLCV snapshot for one pair, as fetched from the quote provider.
///
/// `volume` stays a string because the provider omits it for metals and
/// some crosses; "0" is the placeholder. `change_amount = current − open`,
/// `change_percent = change_amount / open × 100`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceData {
    pub pair: String,
    pub current_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub open_price: f64,
    pub volume: String,
    pub change_amount: f64,
    pub change_percent: f64,
}

/// The indicator families the service tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IndicatorKind {
    Rsi,
    Macd,
    Atr,
}

impl IndicatorKind {
    /// Provider endpoint path segment for this indicator.
    pub fn endpoint(self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "rsi",
            IndicatorKind::Macd => "macd",
            IndicatorKind::Atr => "atr",
        }
    }

    /// JSON field carrying the value inside each `values[]` bar.
    pub fn value_field(self) -> &'static str {
        self.endpoint()
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorKind::Rsi => write!(f, "RSI"),
            IndicatorKind::Macd => write!(f, "MACD"),
            IndicatorKind::Atr => write!(f, "ATR"),
        }
    }
}

/// One classified indicator reading for a pair. Overwritten every cycle —
/// the service keeps no indicator history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorReading {
    pub pair: String,
    #[serde(rename = "indicator_name")]
    pub indicator: IndicatorKind,
    pub value: String,
    pub status: String,
    pub color: String,
    pub timeframe: String,
}

/// Per-invocation runtime configuration loaded from `system_config`.
///
/// Built once at the start of an invocation and threaded explicitly —
/// never read from ambient state mid-run.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub api_key: String,
    pub pairs: Vec<String>,
}

/// Decoded per-pair values of one indicator batch response.
pub type IndicatorBatch = HashMap<String, f64>;

/// Coarse service health derived from how stale the persisted snapshots are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemHealth {
    Healthy,
    Warning,
    Error,
}

impl SystemHealth {
    /// Classify from the age (minutes) of the last price and indicator
    /// updates. A missing timestamp counts as infinitely stale.
    pub fn from_ages(price_age_min: Option<f64>, indicator_age_min: Option<f64>) -> Self {
        let price = price_age_min.unwrap_or(f64::INFINITY);
        let indicator = indicator_age_min.unwrap_or(f64::INFINITY);

        if price > 30.0 || indicator > 60.0 {
            SystemHealth::Error
        } else if price > 10.0 || indicator > 30.0 {
            SystemHealth::Warning
        } else {
            SystemHealth::Healthy
        }
    }
}

impl std::fmt::Display for SystemHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemHealth::Healthy => write!(f, "healthy"),
            SystemHealth::Warning => write!(f, "warning"),
            SystemHealth::Error => write!(f, "error"),
        }
    }
}
