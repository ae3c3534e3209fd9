//! Orchestration of the periodic update jobs.
//!
//! Each job runs to completion within one invocation: load runtime config,
//! fetch, persist, evaluate, stamp the update timestamp. Invocations share
//! nothing but the database; a sibling invocation racing on the same rows
//! resolves by last write wins.

pub mod indicators;
pub mod scheduler;
pub mod signals;
pub mod trigger;

use std::sync::Arc;

use common::{PairBook, QuoteSource};
use store::Store;

/// Everything a job needs, threaded explicitly per invocation.
#[derive(Clone)]
pub struct JobContext {
    pub store: Store,
    pub source: Arc<dyn QuoteSource>,
    pub pairs: Arc<PairBook>,
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::HashMap;
    use std::sync::Arc;

    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;

    use common::{IndicatorBatch, IndicatorKind, PairBook, PriceData, QuoteSource};
    use store::Store;

    use crate::JobContext;

    /// Canned provider double for job tests.
    #[derive(Default)]
    pub struct MockSource {
        pub quotes: Vec<PriceData>,
        pub indicators: HashMap<IndicatorKind, IndicatorBatch>,
    }

    #[async_trait]
    impl QuoteSource for MockSource {
        async fn latest_quotes(&self, _api_key: &str, _pairs: &[String]) -> Vec<PriceData> {
            self.quotes.clone()
        }

        async fn indicator_values(
            &self,
            _api_key: &str,
            kind: IndicatorKind,
            _pairs: &[String],
        ) -> Option<IndicatorBatch> {
            self.indicators.get(&kind).cloned()
        }
    }

    pub async fn test_context(source: MockSource) -> JobContext {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        sqlx::migrate!("../../migrations")
            .run(&pool)
            .await
            .expect("migrations");

        JobContext {
            store: Store::new(pool),
            source: Arc::new(source),
            pairs: Arc::new(PairBook::default()),
        }
    }

    pub async fn seed_config(ctx: &JobContext, key: &str, value: &str) {
        sqlx::query("INSERT INTO system_config (config_key, config_value) VALUES (?1, ?2)")
            .bind(key)
            .bind(value)
            .execute(ctx.store.pool())
            .await
            .unwrap();
    }

    pub fn quote(pair: &str, current: f64) -> PriceData {
        PriceData {
            pair: pair.into(),
            current_price: current,
            high_price: current + 1.0,
            low_price: current - 1.0,
            open_price: current - 0.5,
            volume: "0".into(),
            change_amount: 0.5,
            change_percent: 0.1,
        }
    }
}
