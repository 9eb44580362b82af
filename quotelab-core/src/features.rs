//! Feature and label building for the forecast model.
//!
//! Per ticker, sorted by date ascending, trailing-only indicators are
//! computed (RSI, fast/slow SMA, distance from fast SMA, rolling volatility)
//! and a forward-looking binary label is attached: positive iff the forward
//! return over `horizon` bars exceeds `threshold`.
//!
//! Rows with incomplete indicator warm-up are dropped, and so are the final
//! `horizon` rows of each ticker (their future is unknown). Both drops are
//! hard requirements — a row with an undefined feature or a peeked label
//! poisons training.

use crate::domain::PriceBar;
use crate::indicators::{Indicator, RollingVolatility, Rsi, Sma};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Indicator and label parameters.
#[derive(Debug, Clone, Copy)]
pub struct FeatureParams {
    pub rsi_period: usize,
    pub sma_fast: usize,
    pub sma_slow: usize,
    pub vol_window: usize,
    /// Forward-return horizon in trading days.
    pub horizon: usize,
    /// Forward-return threshold for the positive label.
    pub threshold: f64,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            sma_fast: 20,
            sma_slow: 50,
            vol_window: 20,
            horizon: 30,
            threshold: 0.05,
        }
    }
}

/// One feature row. `target` is `None` for scoring rows, where the forward
/// return is not yet known.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: f64,
    pub sma_fast: f64,
    pub sma_slow: f64,
    pub dist_sma_fast: f64,
    pub volatility: f64,
    pub target: Option<bool>,
}

impl FeatureRow {
    /// Model inputs, in the order the classifier was trained with.
    pub fn inputs(&self) -> Vec<f64> {
        vec![self.rsi, self.dist_sma_fast, self.volatility]
    }
}

/// Group a flat bar list by ticker, each group sorted by date ascending.
pub fn group_by_ticker(bars: Vec<PriceBar>) -> BTreeMap<String, Vec<PriceBar>> {
    let mut by_ticker: BTreeMap<String, Vec<PriceBar>> = BTreeMap::new();
    for bar in bars {
        by_ticker.entry(bar.ticker.clone()).or_default().push(bar);
    }
    for series in by_ticker.values_mut() {
        series.sort_by_key(|b| b.date);
    }
    by_ticker
}

/// Per-ticker indicator series, computed once.
struct IndicatorSeries {
    rsi: Vec<f64>,
    sma_fast: Vec<f64>,
    sma_slow: Vec<f64>,
    volatility: Vec<f64>,
}

impl IndicatorSeries {
    fn compute(bars: &[PriceBar], params: &FeatureParams) -> Self {
        Self {
            rsi: Rsi::new(params.rsi_period).compute(bars),
            sma_fast: Sma::new(params.sma_fast).compute(bars),
            sma_slow: Sma::new(params.sma_slow).compute(bars),
            volatility: RollingVolatility::new(params.vol_window).compute(bars),
        }
    }

    fn row_at(&self, bars: &[PriceBar], i: usize, target: Option<bool>) -> Option<FeatureRow> {
        let bar = &bars[i];
        let rsi = self.rsi[i];
        let sma_fast = self.sma_fast[i];
        let sma_slow = self.sma_slow[i];
        let volatility = self.volatility[i];
        if rsi.is_nan() || sma_fast.is_nan() || sma_slow.is_nan() || volatility.is_nan() {
            return None;
        }
        if sma_fast == 0.0 {
            return None;
        }
        Some(FeatureRow {
            ticker: bar.ticker.clone(),
            date: bar.date,
            close: bar.close,
            rsi,
            sma_fast,
            sma_slow,
            dist_sma_fast: bar.close / sma_fast - 1.0,
            volatility,
            target,
        })
    }
}

/// Build training rows for every ticker: complete indicators and a complete
/// forward label. The final `horizon` rows per ticker are excluded entirely.
pub fn build_training_rows(
    by_ticker: &BTreeMap<String, Vec<PriceBar>>,
    params: &FeatureParams,
) -> Vec<FeatureRow> {
    let mut rows = Vec::new();

    for bars in by_ticker.values() {
        if bars.len() <= params.horizon {
            continue;
        }
        let series = IndicatorSeries::compute(bars, params);

        for i in 0..(bars.len() - params.horizon) {
            if bars[i].close == 0.0 {
                continue;
            }
            let forward_return = bars[i + params.horizon].close / bars[i].close - 1.0;
            let target = forward_return > params.threshold;
            if let Some(row) = series.row_at(bars, i, Some(target)) {
                rows.push(row);
            }
        }
    }

    rows
}

/// Build one scoring row per ticker: the most recent bar with complete
/// indicators, no label required.
pub fn build_scoring_rows(
    by_ticker: &BTreeMap<String, Vec<PriceBar>>,
    params: &FeatureParams,
) -> Vec<FeatureRow> {
    let mut rows = Vec::new();

    for bars in by_ticker.values() {
        if bars.is_empty() {
            continue;
        }
        let series = IndicatorSeries::compute(bars, params);
        if let Some(row) = (0..bars.len())
            .rev()
            .find_map(|i| series.row_at(bars, i, None))
        {
            rows.push(row);
        }
    }

    rows
}

/// Chronological train/test split by a global date cutoff.
///
/// The cutoff is the `1 - test_fraction` quantile of the distinct dates in
/// the row set, applied uniformly across tickers: train is everything on or
/// before the cutoff date, test everything after. A row-count cut over the
/// concatenated frame would let tickers straddle the boundary and leak
/// cross-sectional information.
pub fn chronological_split(
    rows: Vec<FeatureRow>,
    test_fraction: f64,
) -> (Vec<FeatureRow>, Vec<FeatureRow>) {
    assert!(
        (0.0..1.0).contains(&test_fraction),
        "test_fraction must be in [0, 1)"
    );

    let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    dates.sort_unstable();
    dates.dedup();

    if dates.len() < 2 || test_fraction == 0.0 {
        return (rows, Vec::new());
    }

    let train_dates = ((dates.len() as f64) * (1.0 - test_fraction)).floor() as usize;
    let train_dates = train_dates.clamp(1, dates.len() - 1);
    let cutoff = dates[train_dates - 1];

    let (train, test) = rows.into_iter().partition(|r| r.date <= cutoff);
    (train, test)
}
