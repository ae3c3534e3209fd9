use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use common::{Error, IndicatorBatch, IndicatorKind, PriceData, QuoteSource, Result};

use crate::decode;

/// Bar interval used for price snapshots.
const QUOTE_INTERVAL: &str = "1min";
/// Bar interval used for indicator values.
const INDICATOR_INTERVAL: &str = "15min";

/// REST client for the TwelveData market-data API.
///
/// Holds only the HTTP client and base URL; the API key is per-invocation
/// runtime configuration and is passed into each call.
pub struct TwelveDataClient {
    base: String,
    http: Client,
}

impl TwelveDataClient {
    /// Panics on an invalid base URL — this is a bootstrap-time error.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Url::parse(&base).unwrap_or_else(|e| panic!("Invalid provider base URL '{base}': {e}"));
        Self {
            base: base.trim_end_matches('/').to_string(),
            http: Client::builder()
                .use_rustls_tls()
                .build()
                .expect("Failed to build HTTP client"),
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let mut url = Url::parse(&format!("{}/{path}", self.base))
            .map_err(|e| Error::Http(e.to_string()))?;
        url.query_pairs_mut().extend_pairs(query);

        debug!(endpoint = %path, "Requesting provider data");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = resp.status();
        let body: Value = resp.json().await.map_err(|e| Error::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Provider(format!("HTTP {status}: {body}")));
        }
        Ok(body)
    }
}

#[async_trait]
impl QuoteSource for TwelveDataClient {
    async fn latest_quotes(&self, api_key: &str, pairs: &[String]) -> Vec<PriceData> {
        if pairs.is_empty() {
            warn!("No pairs requested, skipping quote fetch");
            return Vec::new();
        }

        let symbols = pairs.join(",");
        match self
            .get_json(
                "time_series",
                &[
                    ("apikey", api_key),
                    ("interval", QUOTE_INTERVAL),
                    ("symbol", &symbols),
                ],
            )
            .await
        {
            Ok(body) => decode::decode_quotes(&body, pairs),
            Err(e) => {
                error!(error = %e, "Quote fetch failed");
                Vec::new()
            }
        }
    }

    async fn indicator_values(
        &self,
        api_key: &str,
        kind: IndicatorKind,
        pairs: &[String],
    ) -> Option<IndicatorBatch> {
        if pairs.is_empty() {
            warn!(indicator = %kind, "No pairs requested, skipping indicator fetch");
            return None;
        }

        let symbols = pairs.join(",");
        match self
            .get_json(
                kind.endpoint(),
                &[
                    ("apikey", api_key),
                    ("interval", INDICATOR_INTERVAL),
                    ("symbol", &symbols),
                ],
            )
            .await
        {
            Ok(body) => Some(decode::decode_indicators(&body, kind.value_field())),
            Err(e) => {
                error!(indicator = %kind, error = %e, "Indicator fetch failed");
                None
            }
        }
    }
}
