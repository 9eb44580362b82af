//! Indicator trait and concrete implementations.
//!
//! Indicators are pure functions: bar history in, numeric series out. The
//! first `lookback()` values are `f64::NAN` (warm-up).
//!
//! # Look-ahead contamination guard
//! No indicator value at bar t may depend on price data from bar t+1 or
//! later. Every indicator must pass the truncated-vs-full series test.

pub mod rsi;
pub mod sma;
pub mod volatility;

pub use rsi::Rsi;
pub use sma::Sma;
pub use volatility::RollingVolatility;

use crate::domain::PriceBar;

/// Trait for indicators.
///
/// Indicators take a full per-ticker bar series, sorted by date ascending,
/// and produce an output series of the same length. The first `lookback()`
/// values are `f64::NAN`.
pub trait Indicator {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of bars needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                date: base_date + chrono::Duration::days(i as i64),
                ticker: "TEST4.SA".to_string(),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                adjusted_close: Some(close),
                volume: 1000,
                dividends: 0.0,
                split_ratio: 0.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
