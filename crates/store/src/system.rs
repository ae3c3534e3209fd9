use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::warn;

use common::{Error, IndicatorReading, Result, RuntimeConfig};

use crate::Store;

/// Config key holding the quote-provider API key.
const API_KEY: &str = "api_key_twelvedata";
/// Config key holding the comma-separated supported-pairs list.
const SUPPORTED_PAIRS: &str = "supported_pairs";

/// How stale the persisted snapshots are, in minutes. `None` when a
/// timestamp is missing or unreadable.
#[derive(Debug, Clone, Default)]
pub struct UpdateAges {
    pub last_price_update: Option<String>,
    pub last_indicator_update: Option<String>,
    pub price_minutes: Option<f64>,
    pub indicator_minutes: Option<f64>,
}

#[derive(FromRow)]
struct ConfigRow {
    config_key: String,
    config_value: Option<String>,
}

impl Store {
    /// Build the per-invocation runtime config. A missing API key is a
    /// configuration error and fails the whole invocation; the pairs list
    /// may legitimately be empty (the fetch step then degrades to no data).
    pub async fn runtime_config(&self) -> Result<RuntimeConfig> {
        let rows: Vec<ConfigRow> = sqlx::query_as(
            "SELECT config_key, config_value FROM system_config WHERE config_key IN (?1, ?2)",
        )
        .bind(API_KEY)
        .bind(SUPPORTED_PAIRS)
        .fetch_all(&self.pool)
        .await?;

        let mut api_key = None;
        let mut pairs = Vec::new();
        for row in rows {
            match (row.config_key.as_str(), row.config_value) {
                (API_KEY, Some(value)) if !value.is_empty() => api_key = Some(value),
                (SUPPORTED_PAIRS, Some(value)) => {
                    pairs = value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();
                }
                _ => {}
            }
        }

        let api_key = api_key
            .ok_or_else(|| Error::Config("provider API key not configured".to_string()))?;
        Ok(RuntimeConfig { api_key, pairs })
    }

    /// Stamp a `last_*_update` config value with the current time.
    /// Update-only, like every other config write.
    pub async fn touch_config(&self, key: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "UPDATE system_config SET config_value = ?1, updated_at = ?1 WHERE config_key = ?2",
        )
        .bind(&now)
        .bind(key)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Overwrite one indicator reading, matched on upper-cased pair and
    /// indicator name. There is deliberately no insert fallback: rows are
    /// provisioned once by the surrounding system, and a zero-row update
    /// surfaces a mis-seeded environment in the logs.
    pub async fn update_indicator(&self, reading: &IndicatorReading) -> Result<u64> {
        let updated_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE technical_indicators
            SET value = ?1, status = ?2, color = ?3, timeframe = ?4, updated_at = ?5
            WHERE pair = ?6 AND indicator_name = ?7
            "#,
        )
        .bind(&reading.value)
        .bind(&reading.status)
        .bind(&reading.color)
        .bind(&reading.timeframe)
        .bind(&updated_at)
        .bind(reading.pair.to_uppercase())
        .bind(reading.indicator.to_string())
        .execute(&self.pool)
        .await?;

        let affected = result.rows_affected();
        if affected == 0 {
            warn!(
                pair = %reading.pair,
                indicator = %reading.indicator,
                "No indicator row matched, update skipped"
            );
        }
        Ok(affected)
    }

    /// Ages of the last price/indicator updates, for health reporting.
    pub async fn update_ages(&self) -> Result<UpdateAges> {
        let rows: Vec<ConfigRow> = sqlx::query_as(
            "SELECT config_key, config_value FROM system_config WHERE config_key IN (?1, ?2)",
        )
        .bind("last_price_update")
        .bind("last_indicator_update")
        .fetch_all(&self.pool)
        .await?;

        let mut ages = UpdateAges::default();
        let now = Utc::now();
        for row in rows {
            let minutes = row
                .config_value
                .as_deref()
                .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                .map(|t| (now - t.with_timezone(&Utc)).num_seconds() as f64 / 60.0);
            match row.config_key.as_str() {
                "last_price_update" => {
                    ages.last_price_update = row.config_value;
                    ages.price_minutes = minutes;
                }
                "last_indicator_update" => {
                    ages.last_indicator_update = row.config_value;
                    ages.indicator_minutes = minutes;
                }
                _ => {}
            }
        }
        Ok(ages)
    }
}
