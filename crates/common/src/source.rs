use async_trait::async_trait;

use crate::{IndicatorBatch, IndicatorKind, PriceData};

/// Abstraction over the external quote provider.
///
/// `TwelveDataClient` in `crates/provider` implements this for production;
/// job tests substitute an in-memory double. The API key is threaded in per
/// call because it is per-invocation runtime configuration, not process
/// state.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Latest OHLCV snapshot for each requested pair. Pairs the provider
    /// errored on (or returned no bars for) are skipped; a total provider
    /// failure yields an empty Vec, never an error.
    async fn latest_quotes(&self, api_key: &str, pairs: &[String]) -> Vec<PriceData>;

    /// Latest value of one indicator per pair. `None` when the whole batch
    /// request failed; per-symbol failures are simply absent from the map.
    async fn indicator_values(
        &self,
        api_key: &str,
        kind: IndicatorKind,
        pairs: &[String],
    ) -> Option<IndicatorBatch>;
}
