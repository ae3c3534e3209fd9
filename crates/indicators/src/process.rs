use std::collections::HashMap;

use tracing::debug;

use common::{IndicatorBatch, IndicatorKind, IndicatorReading};

use crate::classify::{
    classify_atr, classify_macd, classify_rsi, format_atr, format_macd, format_rsi,
};

/// Timeframe label stored with every reading.
const TIMEFRAME: &str = "15M";

/// Turn one indicator family's decoded batch into readings, walking the
/// configured pair list. Pairs absent from the batch are skipped; ATR also
/// needs a positive current price for the pair and is skipped without one.
/// Families never see each other's data, so one family failing leaves the
/// others intact.
pub fn readings_for(
    kind: IndicatorKind,
    batch: &IndicatorBatch,
    pairs: &[String],
    prices: &HashMap<String, f64>,
) -> Vec<IndicatorReading> {
    let mut readings = Vec::new();

    for pair in pairs {
        let Some(&value) = batch.get(pair) else {
            debug!(pair = %pair, indicator = %kind, "No batch value for pair");
            continue;
        };

        let (display, classification) = match kind {
            IndicatorKind::Rsi => (format_rsi(value), classify_rsi(value)),
            IndicatorKind::Macd => (format_macd(value), classify_macd(value)),
            IndicatorKind::Atr => {
                let Some(&price) = prices.get(pair).filter(|&&p| p > 0.0) else {
                    debug!(pair = %pair, "No current price for pair, skipping ATR");
                    continue;
                };
                (format_atr(value), classify_atr(value, price))
            }
        };

        readings.push(IndicatorReading {
            pair: pair.clone(),
            indicator: kind,
            value: display,
            status: classification.status.to_string(),
            color: classification.color.to_string(),
            timeframe: TIMEFRAME.to_string(),
        });
    }

    readings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rsi_readings_ignore_prices() {
        let batch: IndicatorBatch = [("XAU/USD".to_string(), 72.31)].into();
        let readings = readings_for(
            IndicatorKind::Rsi,
            &batch,
            &pairs(&["XAU/USD"]),
            &HashMap::new(),
        );

        assert_eq!(readings.len(), 1);
        let r = &readings[0];
        assert_eq!(r.value, "72.3");
        assert_eq!(r.status, "Overbought");
        assert_eq!(r.timeframe, "15M");
    }

    #[test]
    fn atr_skipped_without_price_for_pair() {
        let batch: IndicatorBatch = [
            ("XAU/USD".to_string(), 25.0),
            ("BTC/USD".to_string(), 900.0),
        ]
        .into();
        let prices: HashMap<String, f64> = [("XAU/USD".to_string(), 2000.0)].into();

        let readings = readings_for(
            IndicatorKind::Atr,
            &batch,
            &pairs(&["XAU/USD", "BTC/USD"]),
            &prices,
        );

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].pair, "XAU/USD");
        assert_eq!(readings[0].status, "Normal Volatility");
        assert_eq!(readings[0].value, "25.0000");
    }

    #[test]
    fn atr_skipped_for_zero_price() {
        let batch: IndicatorBatch = [("XAU/USD".to_string(), 25.0)].into();
        let prices: HashMap<String, f64> = [("XAU/USD".to_string(), 0.0)].into();
        assert!(readings_for(IndicatorKind::Atr, &batch, &pairs(&["XAU/USD"]), &prices).is_empty());
    }

    #[test]
    fn pairs_absent_from_batch_are_skipped() {
        let batch: IndicatorBatch = [("XAU/USD".to_string(), 0.62)].into();
        let readings = readings_for(
            IndicatorKind::Macd,
            &batch,
            &pairs(&["XAU/USD", "EUR/USD"]),
            &HashMap::new(),
        );
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, "+0.62");
        assert_eq!(readings[0].status, "Buy");
    }
}
