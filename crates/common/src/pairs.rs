use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Side;

/// Static metadata for one tradable pair.
///
/// Example `config/pairs.toml`:
/// ```toml
/// [[pair]]
/// symbol = "XAU/USD"
/// name = "Gold"
/// pip_value = 0.01
/// digits = 2
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PairSpec {
    /// Provider symbol, slash-delimited, e.g. "XAU/USD".
    pub symbol: String,
    /// Human-readable name shown in logs.
    pub name: String,
    /// Smallest standard price increment for the pair.
    pub pip_value: f64,
    /// Display decimal places.
    pub digits: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct PairFileConfig {
    #[serde(rename = "pair")]
    pairs: Vec<PairSpec>,
}

/// Lookup table of pair metadata, keyed by upper-cased symbol.
#[derive(Debug, Clone, Default)]
pub struct PairBook {
    specs: HashMap<String, PairSpec>,
}

impl PairBook {
    /// Load from a TOML file. Exits process on error.
    pub fn load(path: &str) -> Self {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read pairs config at '{path}': {e}"));
        let file: PairFileConfig = toml::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse pairs config at '{path}': {e}"));
        Self::from_specs(file.pairs)
    }

    pub fn from_specs(specs: Vec<PairSpec>) -> Self {
        Self {
            specs: specs
                .into_iter()
                .map(|s| (s.symbol.to_uppercase(), s))
                .collect(),
        }
    }

    pub fn get(&self, pair: &str) -> Option<&PairSpec> {
        self.specs.get(&pair.to_uppercase())
    }

    /// Format a price with the pair's display digits; unknown pairs use 4.
    pub fn format_price(&self, pair: &str, price: f64) -> String {
        let digits = self.get(pair).map(|s| s.digits).unwrap_or(4);
        format!("{price:.digits$}", digits = digits as usize)
    }

    /// Signed pip distance from entry to exit in the direction of the trade.
    /// `None` for pairs without metadata.
    pub fn pips_between(&self, pair: &str, entry: f64, exit: f64, side: Side) -> Option<i64> {
        let spec = self.get(pair)?;
        let diff = match side {
            Side::Buy => exit - entry,
            Side::Sell => entry - exit,
        };
        Some((diff / spec.pip_value).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> PairBook {
        PairBook::from_specs(vec![
            PairSpec {
                symbol: "XAU/USD".into(),
                name: "Gold".into(),
                pip_value: 0.01,
                digits: 2,
            },
            PairSpec {
                symbol: "EUR/USD".into(),
                name: "Euro/US Dollar".into(),
                pip_value: 0.0001,
                digits: 4,
            },
        ])
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let book = book();
        assert!(book.get("xau/usd").is_some());
        assert!(book.get("XAU/USD").is_some());
        assert!(book.get("GBP/JPY").is_none());
    }

    #[test]
    fn format_uses_pair_digits() {
        let book = book();
        assert_eq!(book.format_price("XAU/USD", 2012.3456), "2012.35");
        assert_eq!(book.format_price("EUR/USD", 1.23456), "1.2346"); // 4 digits
        assert_eq!(book.format_price("UNKNOWN", 1.5), "1.5000");
    }

    #[test]
    fn pips_signed_by_trade_direction() {
        let book = book();
        assert_eq!(
            book.pips_between("XAU/USD", 2000.0, 2010.0, Side::Buy),
            Some(1000)
        );
        assert_eq!(
            book.pips_between("XAU/USD", 2000.0, 2010.0, Side::Sell),
            Some(-1000)
        );
        assert_eq!(book.pips_between("GBP/JPY", 1.0, 2.0, Side::Buy), None);
    }
}
