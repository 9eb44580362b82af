//! Forecast orchestration: features → split → forest → evaluation → picks.
//!
//! Consumes the full normalized price history (as loaded from the store,
//! ordered by ticker and date), trains the classifier on the chronological
//! head, evaluates on the tail, and scores the most recent row per ticker.

use crate::domain::PriceBar;
use crate::features::{
    build_scoring_rows, build_training_rows, chronological_split, group_by_ticker, FeatureParams,
};
use crate::forest::{evaluate, ForestError, ForestParams, RandomForest, TrainingMetrics};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

/// Everything the forecast run needs beyond the price history itself.
#[derive(Debug, Clone, Copy)]
pub struct ForecastOptions {
    pub features: FeatureParams,
    pub forest: ForestParams,
    /// Fraction of distinct dates held out as the evaluation tail.
    pub test_fraction: f64,
    /// Minimum predicted probability for a ticker to surface as a pick.
    pub confidence: f64,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            features: FeatureParams::default(),
            forest: ForestParams::default(),
            test_fraction: 0.2,
            confidence: 0.4,
        }
    }
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("not enough history: {rows} usable training rows (indicator warm-up and label look-ahead both eat rows; download a longer window)")]
    NotEnoughData { rows: usize },

    #[error("model training failed")]
    Forest(#[from] ForestError),
}

/// One surfaced ticker, with the context a reader needs to judge it.
#[derive(Debug, Clone, Serialize)]
pub struct Pick {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub rsi: f64,
    pub probability: f64,
}

/// Full result of a forecast run.
#[derive(Debug, Serialize)]
pub struct ForecastReport {
    pub metrics: TrainingMetrics,
    pub train_rows: usize,
    pub test_rows: usize,
    pub scored_tickers: usize,
    pub confidence: f64,
    pub picks: Vec<Pick>,
}

impl ForecastReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Minimum combined training rows before fitting is worth attempting.
const MIN_TRAINING_ROWS: usize = 50;

/// Train, evaluate, and score.
pub fn run_forecast(
    bars: Vec<PriceBar>,
    opts: &ForecastOptions,
) -> Result<ForecastReport, ForecastError> {
    let by_ticker = group_by_ticker(bars);
    let rows = build_training_rows(&by_ticker, &opts.features);

    if rows.len() < MIN_TRAINING_ROWS {
        return Err(ForecastError::NotEnoughData { rows: rows.len() });
    }

    let (train, test) = chronological_split(rows, opts.test_fraction);
    if train.is_empty() || test.is_empty() {
        return Err(ForecastError::NotEnoughData { rows: train.len() });
    }

    info!(
        train_rows = train.len(),
        test_rows = test.len(),
        trees = opts.forest.n_trees,
        "training forest"
    );

    let x_train: Vec<Vec<f64>> = train.iter().map(|r| r.inputs()).collect();
    let y_train: Vec<bool> = train.iter().map(|r| r.target.unwrap_or(false)).collect();
    let forest = RandomForest::fit(&x_train, &y_train, &opts.forest)?;

    let predictions: Vec<bool> = test.iter().map(|r| forest.predict(&r.inputs())).collect();
    let labels: Vec<bool> = test.iter().map(|r| r.target.unwrap_or(false)).collect();
    let metrics = evaluate(&predictions, &labels);

    let scoring = build_scoring_rows(&by_ticker, &opts.features);
    let scored_tickers = scoring.len();

    let mut picks: Vec<Pick> = scoring
        .into_iter()
        .map(|row| {
            let probability = forest.predict_proba(&row.inputs());
            Pick {
                ticker: row.ticker,
                date: row.date,
                close: row.close,
                rsi: row.rsi,
                probability,
            }
        })
        .filter(|p| p.probability >= opts.confidence)
        .collect();

    picks.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(ForecastReport {
        metrics,
        train_rows: train.len(),
        test_rows: test.len(),
        scored_tickers,
        confidence: opts.confidence,
        picks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn series(ticker: &str, closes: &[f64]) -> Vec<PriceBar> {
        let base = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: base + Duration::days(i as i64),
                ticker: ticker.to_string(),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                adjusted_close: Some(close),
                volume: 1000,
                dividends: 0.0,
                split_ratio: 0.0,
            })
            .collect()
    }

    fn test_options() -> ForecastOptions {
        ForecastOptions {
            features: FeatureParams {
                rsi_period: 3,
                sma_fast: 4,
                sma_slow: 6,
                vol_window: 3,
                horizon: 5,
                threshold: 0.05,
            },
            forest: ForestParams {
                n_trees: 15,
                min_samples_leaf: 3,
                max_depth: 6,
                seed: 42,
            },
            test_fraction: 0.2,
            confidence: 0.4,
        }
    }

    /// A riser compounding 3%/day and a flat line: the model should rank the
    /// riser far above the flat ticker.
    #[test]
    fn ranks_rising_ticker_above_flat_one() {
        let mut closes_up = vec![100.0];
        for _ in 0..119 {
            let last = *closes_up.last().unwrap();
            closes_up.push(last * 1.03);
        }
        let mut bars = series("UP3.SA", &closes_up);
        bars.extend(series("FLAT3.SA", &[100.0; 120]));

        let report = run_forecast(bars, &test_options()).unwrap();

        assert_eq!(report.scored_tickers, 2);
        assert!(!report.picks.is_empty());
        assert_eq!(report.picks[0].ticker, "UP3.SA");
        assert!(report.picks[0].probability > 0.5);
        // Picks are sorted descending.
        for w in report.picks.windows(2) {
            assert!(w[0].probability >= w[1].probability);
        }
        // The flat ticker never exceeds the threshold return.
        assert!(report
            .picks
            .iter()
            .all(|p| p.ticker != "FLAT3.SA" || p.probability < 0.5));
    }

    #[test]
    fn too_little_history_is_an_error() {
        let bars = series("PETR4.SA", &[100.0; 20]);
        let err = run_forecast(bars, &test_options()).unwrap_err();
        assert!(matches!(err, ForecastError::NotEnoughData { .. }));
    }

    #[test]
    fn report_serializes_to_json() {
        let mut closes = vec![100.0];
        for i in 0..119 {
            let last = *closes.last().unwrap();
            // Alternate up and down so both classes appear.
            let factor = if i % 2 == 0 { 1.04 } else { 0.98 };
            closes.push(last * factor);
        }
        let bars = series("MIX3.SA", &closes);

        let report = run_forecast(bars, &test_options()).unwrap();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"metrics\""));
        assert!(json.contains("\"picks\""));
    }
}
