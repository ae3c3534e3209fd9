use std::collections::HashMap;

use chrono::Utc;
use sqlx::FromRow;

use common::{PriceData, Result};

use crate::Store;

impl Store {
    /// Upsert the latest snapshot for one pair. Rows are keyed by pair and
    /// overwritten every cycle — no history is kept.
    pub async fn upsert_price_summary(&self, price: &PriceData) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO price_summary (id, pair, current_price, high_price, low_price,
                                       open_price, volume, change_amount, change_percent, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(pair) DO UPDATE SET
                current_price = excluded.current_price,
                high_price = excluded.high_price,
                low_price = excluded.low_price,
                open_price = excluded.open_price,
                volume = excluded.volume,
                change_amount = excluded.change_amount,
                change_percent = excluded.change_percent,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&price.pair)
        .bind(price.current_price)
        .bind(price.high_price)
        .bind(price.low_price)
        .bind(price.open_price)
        .bind(&price.volume)
        .bind(price.change_amount)
        .bind(price.change_percent)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Compatibility mirror of `upsert_price_summary` for older consumers.
    pub async fn upsert_market_data(&self, price: &PriceData) -> Result<()> {
        let id = uuid::Uuid::new_v4().to_string();
        let updated_at = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO market_data (id, pair, price, change, change_percent,
                                     high, low, volume, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(pair) DO UPDATE SET
                price = excluded.price,
                change = excluded.change,
                change_percent = excluded.change_percent,
                high = excluded.high,
                low = excluded.low,
                volume = excluded.volume,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&price.pair)
        .bind(price.current_price)
        .bind(price.change_amount)
        .bind(price.change_percent)
        .bind(price.high_price)
        .bind(price.low_price)
        .bind(&price.volume)
        .bind(&updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Latest stored price per pair, for indicator classification.
    pub async fn market_prices(&self) -> Result<HashMap<String, f64>> {
        #[derive(FromRow)]
        struct Row {
            pair: String,
            price: Option<f64>,
        }

        let rows: Vec<Row> = sqlx::query_as("SELECT pair, price FROM market_data")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| r.price.map(|p| (r.pair, p)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_pool;

    fn gold(current: f64) -> PriceData {
        PriceData {
            pair: "XAU/USD".into(),
            current_price: current,
            high_price: current + 5.0,
            low_price: current - 5.0,
            open_price: current - 2.0,
            volume: "0".into(),
            change_amount: 2.0,
            change_percent: 0.1,
        }
    }

    #[tokio::test]
    async fn price_summary_upsert_keeps_one_row_per_pair() {
        let store = Store::new(test_pool().await);
        store.upsert_price_summary(&gold(2000.0)).await.unwrap();
        store.upsert_price_summary(&gold(2010.0)).await.unwrap();

        let (count, current): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), MAX(current_price) FROM price_summary WHERE pair = 'XAU/USD'",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(count, 1);
        assert!((current - 2010.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn market_prices_reflect_latest_upsert() {
        let store = Store::new(test_pool().await);
        store.upsert_market_data(&gold(2000.0)).await.unwrap();
        store.upsert_market_data(&gold(2007.5)).await.unwrap();

        let prices = store.market_prices().await.unwrap();
        assert_eq!(prices.len(), 1);
        assert!((prices["XAU/USD"] - 2007.5).abs() < 1e-9);
    }
}
