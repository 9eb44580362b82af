//! PriceBar — the fundamental market data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One normalized daily bar for a single instrument.
///
/// `(date, ticker)` is the primary key in the relational store — exactly one
/// bar per instrument per trading day. `adjusted_close` stays `None` when the
/// source never reported it (delisted or illiquid instruments); it must not
/// be coerced to zero, which would corrupt downstream return calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub ticker: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adjusted_close: Option<f64>,
    pub volume: u64,
    pub dividends: f64,
    pub split_ratio: f64,
}

impl PriceBar {
    /// Basic OHLC sanity check: finite prices, high >= low, open/close within range.
    pub fn is_sane(&self) -> bool {
        let finite = self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite();
        finite
            && self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Canonical column set and order for the normalized row-set.
///
/// Every normalized file must produce exactly these columns in this order so
/// that concatenation and the bulk insert never misalign by position.
pub const CANONICAL_COLUMNS: [&str; 10] = [
    "date",
    "ticker",
    "open",
    "high",
    "low",
    "close",
    "adjusted_close",
    "volume",
    "dividends",
    "split_ratio",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            ticker: "PETR4.SA".into(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            adjusted_close: Some(103.0),
            volume: 50_000,
            dividends: 0.0,
            split_ratio: 0.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_inverted_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_nan() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(!bar.is_sane());
    }

    #[test]
    fn missing_adjusted_close_does_not_affect_sanity() {
        let mut bar = sample_bar();
        bar.adjusted_close = None;
        assert!(bar.is_sane());
    }

    #[test]
    fn canonical_columns_are_stable() {
        assert_eq!(CANONICAL_COLUMNS.len(), 10);
        assert_eq!(CANONICAL_COLUMNS[0], "date");
        assert_eq!(CANONICAL_COLUMNS[1], "ticker");
        assert_eq!(CANONICAL_COLUMNS[9], "split_ratio");
    }
}
