//! Label and forecast contract tests at production parameters
//! (horizon 30, threshold 5%).

use chrono::{Duration, NaiveDate};
use quotelab_core::domain::PriceBar;
use quotelab_core::features::{build_training_rows, group_by_ticker, FeatureParams};
use quotelab_core::forecast::{run_forecast, ForecastOptions};
use quotelab_core::forest::ForestParams;

fn series(ticker: &str, closes: &[f64]) -> Vec<PriceBar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
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
            volume: 1_000,
            dividends: 0.0,
            split_ratio: 0.0,
        })
        .collect()
}

/// Strictly increasing series at 0.5%/day: the 30-day forward return is
/// ~16%, far above the 5% threshold.
fn rising_closes(n: usize) -> Vec<f64> {
    let mut closes = vec![100.0];
    for _ in 1..n {
        let last = *closes.last().unwrap();
        closes.push(last * 1.005);
    }
    closes
}

#[test]
fn rising_series_labels_positive_at_production_params() {
    let params = FeatureParams::default(); // horizon 30, threshold 0.05
    let n = 200;
    let by_ticker = group_by_ticker(series("UP3.SA", &rising_closes(n)));
    let rows = build_training_rows(&by_ticker, &params);

    assert!(!rows.is_empty());
    // Every surviving row's 30-day forward return exceeds 5%.
    assert!(rows.iter().all(|r| r.target == Some(true)));

    // The final `horizon` rows of the series are excluded entirely.
    let base = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let last_allowed = base + Duration::days((n - params.horizon - 1) as i64);
    assert!(rows.iter().all(|r| r.date <= last_allowed));
    assert_eq!(rows.iter().map(|r| r.date).max().unwrap(), last_allowed);

    // Warm-up: nothing before the slow SMA has data.
    let first_possible = base + Duration::days((params.sma_slow - 1) as i64);
    assert!(rows.iter().all(|r| r.date >= first_possible));
}

#[test]
fn forecast_run_is_deterministic_for_a_seed() {
    let mut bars = series("UP3.SA", &rising_closes(250));
    // A decaying ticker supplies the negative class.
    let falling: Vec<f64> = (0..250).map(|i| 200.0 * 0.998f64.powi(i)).collect();
    bars.extend(series("DOWN3.SA", &falling));

    let opts = ForecastOptions {
        forest: ForestParams {
            n_trees: 20,
            ..ForestParams::default()
        },
        ..ForecastOptions::default()
    };

    let a = run_forecast(bars.clone(), &opts).unwrap();
    let b = run_forecast(bars, &opts).unwrap();

    assert_eq!(a.train_rows, b.train_rows);
    assert_eq!(a.picks.len(), b.picks.len());
    for (pa, pb) in a.picks.iter().zip(&b.picks) {
        assert_eq!(pa.ticker, pb.ticker);
        assert_eq!(pa.probability, pb.probability);
    }
}

#[test]
fn picks_prefer_the_rising_ticker() {
    let mut bars = series("UP3.SA", &rising_closes(250));
    let falling: Vec<f64> = (0..250).map(|i| 200.0 * 0.998f64.powi(i)).collect();
    bars.extend(series("DOWN3.SA", &falling));

    let opts = ForecastOptions {
        forest: ForestParams {
            n_trees: 20,
            ..ForestParams::default()
        },
        ..ForecastOptions::default()
    };
    let report = run_forecast(bars, &opts).unwrap();

    assert_eq!(report.scored_tickers, 2);
    assert!(report
        .picks
        .iter()
        .any(|p| p.ticker == "UP3.SA" && p.probability > 0.5));
    assert!(!report.picks.iter().any(|p| p.ticker == "DOWN3.SA"));
}
