//! Decoding for the provider's loosely-shaped JSON responses.
//!
//! The same envelope is used by the time-series and indicator endpoints:
//! requesting one symbol returns a flat object carrying `meta` and `values`
//! (with `values[0]` the most recent bar); requesting several returns a map
//! from symbol to a per-symbol result, each of which may independently be an
//! error object. Fields are inspected one by one — the shapes are
//! discriminated only by field presence, so typed deserialization would
//! reject half the valid payloads.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{error, warn};

use common::{IndicatorBatch, PriceData};

/// Numbers arrive as strings ("2031.45") but occasionally as raw numbers.
fn parse_decimal(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Provider error objects carry `status: "error"` and a `message`.
fn error_message(result: &Value) -> Option<&str> {
    if result.get("status").and_then(Value::as_str) == Some("error") {
        Some(
            result
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown provider error"),
        )
    } else {
        None
    }
}

/// Most recent bar of a per-symbol series result, if it has one.
fn latest_bar(result: &Value) -> Option<&Value> {
    result.get("values")?.as_array()?.first()
}

/// Build a `PriceData` from one per-symbol series result. `None` when the
/// bar is missing or unusable (unparsable fields, zero open).
fn quote_from_series(pair: &str, result: &Value) -> Option<PriceData> {
    let bar = latest_bar(result)?;

    let open = parse_decimal(bar.get("open"))?;
    let current = parse_decimal(bar.get("close"))?;
    let high = parse_decimal(bar.get("high"))?;
    let low = parse_decimal(bar.get("low"))?;

    if open == 0.0 {
        warn!(pair = %pair, "Bar has zero open price, skipping");
        return None;
    }

    let volume = match bar.get("volume") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    };

    let change = current - open;
    Some(PriceData {
        pair: pair.to_string(),
        current_price: current,
        high_price: high,
        low_price: low,
        open_price: open,
        volume,
        change_amount: change,
        change_percent: change / open * 100.0,
    })
}

/// Decode a time-series response into one record per usable pair.
///
/// `requested` supplies the symbol for the flat single-symbol shape when
/// `meta.symbol` is absent.
pub fn decode_quotes(body: &Value, requested: &[String]) -> Vec<PriceData> {
    let mut results = Vec::new();

    // Whole-batch error object at the top level.
    if let Some(msg) = error_message(body) {
        error!(message = %msg, "Provider returned a batch error");
        return results;
    }

    // CASE 1: single-symbol request, flat structure.
    if body.get("meta").is_some() && body.get("values").is_some() {
        let pair = body
            .pointer("/meta/symbol")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| requested.first().cloned())
            .unwrap_or_default();

        match quote_from_series(&pair, body) {
            Some(price) => results.push(price),
            None => warn!(pair = %pair, "No usable bar in single-symbol response"),
        }
        return results;
    }

    // CASE 2: multi-symbol response, keyed by symbol.
    let Some(map) = body.as_object() else {
        error!("Malformed provider response, expected an object");
        return results;
    };

    for (symbol, result) in map {
        if let Some(msg) = error_message(result) {
            error!(pair = %symbol, message = %msg, "Provider error for symbol");
            continue;
        }
        match quote_from_series(symbol, result) {
            Some(price) => results.push(price),
            None => warn!(pair = %symbol, "No data returned for symbol"),
        }
    }

    results
}

/// Decode an indicator batch response into the latest value per pair.
/// `field` is the per-bar value key ("rsi", "macd", "atr").
pub fn decode_indicators(body: &Value, field: &str) -> IndicatorBatch {
    let mut values = HashMap::new();

    if let Some(msg) = error_message(body) {
        error!(message = %msg, indicator = %field, "Provider returned a batch error");
        return values;
    }

    // Flat single-symbol shape, normalized into a one-entry map.
    if body.get("meta").is_some() && body.get("values").is_some() {
        if let Some(symbol) = body.pointer("/meta/symbol").and_then(Value::as_str) {
            if let Some(v) = latest_bar(body).and_then(|bar| parse_decimal(bar.get(field))) {
                values.insert(symbol.to_string(), v);
            }
        }
        return values;
    }

    let Some(map) = body.as_object() else {
        error!(indicator = %field, "Malformed provider response, expected an object");
        return values;
    };

    for (symbol, result) in map {
        if let Some(msg) = error_message(result) {
            error!(pair = %symbol, message = %msg, indicator = %field, "Provider error for symbol");
            continue;
        }
        match latest_bar(result).and_then(|bar| parse_decimal(bar.get(field))) {
            Some(v) => {
                values.insert(symbol.clone(), v);
            }
            None => warn!(pair = %symbol, indicator = %field, "No usable value for symbol"),
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_symbol_flat_response() {
        let body = json!({
            "meta": { "symbol": "XAU/USD", "interval": "1min" },
            "values": [
                { "datetime": "2024-05-01 12:01:00", "open": "2000.0", "high": "2003.5",
                  "low": "1999.0", "close": "2002.0", "volume": "1234" },
                { "datetime": "2024-05-01 12:00:00", "open": "1998.0", "high": "2001.0",
                  "low": "1997.0", "close": "2000.0" }
            ]
        });

        let quotes = decode_quotes(&body, &pairs(&["XAU/USD"]));
        assert_eq!(quotes.len(), 1);
        let q = &quotes[0];
        assert_eq!(q.pair, "XAU/USD");
        assert_eq!(q.open_price, 2000.0);
        assert_eq!(q.current_price, 2002.0);
        assert_eq!(q.volume, "1234");
        assert!((q.change_amount - 2.0).abs() < 1e-9);
        assert!((q.change_percent - 0.1).abs() < 1e-9);
    }

    #[test]
    fn multi_symbol_skips_erroring_pair() {
        let body = json!({
            "EUR/USD": { "status": "error", "code": 400, "message": "symbol not supported on plan" },
            "XAU/USD": {
                "meta": { "symbol": "XAU/USD" },
                "values": [
                    { "open": "2000.0", "high": "2010.0", "low": "1995.0", "close": "2005.0" }
                ]
            }
        });

        let quotes = decode_quotes(&body, &pairs(&["EUR/USD", "XAU/USD"]));
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].pair, "XAU/USD");
    }

    #[test]
    fn missing_volume_defaults_to_zero() {
        let body = json!({
            "meta": { "symbol": "XAU/USD" },
            "values": [ { "open": "2000.0", "high": "2001.0", "low": "1999.0", "close": "2000.5" } ]
        });
        let quotes = decode_quotes(&body, &pairs(&["XAU/USD"]));
        assert_eq!(quotes[0].volume, "0");
    }

    #[test]
    fn zero_open_price_skips_pair() {
        let body = json!({
            "meta": { "symbol": "XAU/USD" },
            "values": [ { "open": "0", "high": "1.0", "low": "0.5", "close": "0.9" } ]
        });
        assert!(decode_quotes(&body, &pairs(&["XAU/USD"])).is_empty());
    }

    #[test]
    fn unparsable_close_skips_pair() {
        let body = json!({
            "BTC/USD": {
                "values": [ { "open": "60000", "high": "61000", "low": "59000", "close": "n/a" } ]
            }
        });
        assert!(decode_quotes(&body, &pairs(&["BTC/USD"])).is_empty());
    }

    #[test]
    fn batch_error_yields_empty() {
        let body = json!({ "status": "error", "code": 401, "message": "invalid api key" });
        assert!(decode_quotes(&body, &pairs(&["XAU/USD"])).is_empty());
        assert!(decode_indicators(&body, "rsi").is_empty());
    }

    #[test]
    fn indicator_multi_symbol_decode() {
        let body = json!({
            "XAU/USD": { "values": [ { "rsi": "72.31" }, { "rsi": "69.0" } ] },
            "BTC/USD": { "status": "error", "message": "rate limited" },
            "EUR/USD": { "values": [] }
        });
        let batch = decode_indicators(&body, "rsi");
        assert_eq!(batch.len(), 1);
        assert!((batch["XAU/USD"] - 72.31).abs() < 1e-9);
    }

    #[test]
    fn indicator_single_symbol_normalized_by_meta() {
        let body = json!({
            "meta": { "symbol": "XAU/USD", "indicator": { "name": "MACD" } },
            "values": [ { "macd": "-0.62" } ]
        });
        let batch = decode_indicators(&body, "macd");
        assert_eq!(batch.len(), 1);
        assert!((batch["XAU/USD"] + 0.62).abs() < 1e-9);
    }

    #[test]
    fn numeric_fields_accepted_without_quotes() {
        let body = json!({
            "meta": { "symbol": "BTC/USD" },
            "values": [ { "open": 60000.0, "high": 61000.0, "low": 59500.0, "close": 60500.0, "volume": 42 } ]
        });
        let quotes = decode_quotes(&body, &pairs(&["BTC/USD"]));
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].volume, "42");
        assert_eq!(quotes[0].current_price, 60500.0);
    }
}
