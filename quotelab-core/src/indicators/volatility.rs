//! Rolling volatility.
//!
//! Sample standard deviation (ddof = 1) of daily percentage changes over a
//! trailing window. Lookback: window (one extra bar for the first pct-change).

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct RollingVolatility {
    window: usize,
    name: String,
}

impl RollingVolatility {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "volatility window must be >= 2");
        Self {
            window,
            name: format!("volatility_{window}"),
        }
    }
}

impl Indicator for RollingVolatility {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.window
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.window + 1 {
            return result;
        }

        let mut returns = vec![f64::NAN; n];
        for i in 1..n {
            let prev = bars[i - 1].close;
            if prev == 0.0 {
                continue;
            }
            returns[i] = bars[i].close / prev - 1.0;
        }

        for i in self.window..n {
            let window = &returns[(i + 1 - self.window)..=i];
            if window.iter().any(|r| r.is_nan()) {
                continue;
            }
            let mean = window.iter().sum::<f64>() / self.window as f64;
            let var = window
                .iter()
                .map(|r| (r - mean) * (r - mean))
                .sum::<f64>()
                / (self.window - 1) as f64;
            result[i] = var.sqrt();
        }

        result
    }
}
