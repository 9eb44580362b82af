//! Random-forest binary classifier.
//!
//! Bagged CART trees: each tree is grown on a bootstrap sample with Gini
//! impurity splits over a random feature subset per node, and stops at
//! `min_samples_leaf`/`max_depth`. `predict_proba` averages the positive
//! fraction of the reached leaves across trees.
//!
//! Training is deterministic for a given seed: tree t derives its RNG from
//! `seed + t`, independent of anything else in the process.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use thiserror::Error;

/// Forest hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct ForestParams {
    pub n_trees: usize,
    pub min_samples_leaf: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            min_samples_leaf: 10,
            max_depth: 16,
            seed: 42,
        }
    }
}

#[derive(Debug, Error)]
pub enum ForestError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("feature/label length mismatch: {features} rows vs {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("row {row} has {got} features, expected {expected}")]
    RaggedFeatures {
        row: usize,
        got: usize,
        expected: usize,
    },
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        p_positive: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, x: &[f64]) -> f64 {
        match self {
            Node::Leaf { p_positive } => *p_positive,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if x[*feature] <= *threshold {
                    left.predict(x)
                } else {
                    right.predict(x)
                }
            }
        }
    }
}

/// A trained forest.
#[derive(Debug)]
pub struct RandomForest {
    trees: Vec<Node>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on a feature matrix and binary labels.
    pub fn fit(x: &[Vec<f64>], y: &[bool], params: &ForestParams) -> Result<Self, ForestError> {
        if x.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ForestError::LengthMismatch {
                features: x.len(),
                labels: y.len(),
            });
        }
        let n_features = x[0].len();
        for (row, features) in x.iter().enumerate() {
            if features.len() != n_features {
                return Err(ForestError::RaggedFeatures {
                    row,
                    got: features.len(),
                    expected: n_features,
                });
            }
        }

        let n = x.len();
        let mut trees = Vec::with_capacity(params.n_trees);

        for t in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
            let sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            trees.push(grow(x, y, &sample, 0, params, n_features, &mut rng));
        }

        Ok(Self { trees, n_features })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Predicted probability of the positive class.
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        sum / self.trees.len() as f64
    }

    pub fn predict(&self, x: &[f64]) -> bool {
        self.predict_proba(x) >= 0.5
    }
}

fn positive_fraction(y: &[bool], indices: &[usize]) -> f64 {
    let positives = indices.iter().filter(|&&i| y[i]).count();
    positives as f64 / indices.len() as f64
}

fn gini(p: f64) -> f64 {
    2.0 * p * (1.0 - p)
}

/// Grow one node recursively.
fn grow(
    x: &[Vec<f64>],
    y: &[bool],
    indices: &[usize],
    depth: usize,
    params: &ForestParams,
    n_features: usize,
    rng: &mut StdRng,
) -> Node {
    let p = positive_fraction(y, indices);

    let pure = p == 0.0 || p == 1.0;
    if pure || depth >= params.max_depth || indices.len() < 2 * params.min_samples_leaf {
        return Node::Leaf { p_positive: p };
    }

    let mtry = ((n_features as f64).sqrt().round() as usize).clamp(1, n_features);
    let candidates = sample_features(n_features, mtry, rng);

    let parent_impurity = gini(p);
    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, impurity)

    for &feature in &candidates {
        let mut values: Vec<(f64, bool)> =
            indices.iter().map(|&i| (x[i][feature], y[i])).collect();
        values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let total = values.len();
        let total_pos = values.iter().filter(|(_, label)| *label).count();

        let mut left_pos = 0usize;
        for split_at in 1..total {
            if values[split_at - 1].1 {
                left_pos += 1;
            }
            // Only split between distinct values.
            if values[split_at].0 <= values[split_at - 1].0 {
                continue;
            }
            let left_n = split_at;
            let right_n = total - split_at;
            if left_n < params.min_samples_leaf || right_n < params.min_samples_leaf {
                continue;
            }

            let p_left = left_pos as f64 / left_n as f64;
            let p_right = (total_pos - left_pos) as f64 / right_n as f64;
            let impurity = (left_n as f64 * gini(p_left) + right_n as f64 * gini(p_right))
                / total as f64;

            if best.map_or(impurity < parent_impurity - 1e-12, |(_, _, b)| impurity < b) {
                let threshold = (values[split_at - 1].0 + values[split_at].0) / 2.0;
                best = Some((feature, threshold, impurity));
            }
        }
    }

    let Some((feature, threshold, _)) = best else {
        return Node::Leaf { p_positive: p };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .partition(|&&i| x[i][feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(x, y, &left_idx, depth + 1, params, n_features, rng)),
        right: Box::new(grow(x, y, &right_idx, depth + 1, params, n_features, rng)),
    }
}

/// Draw `mtry` distinct feature indices by partial Fisher-Yates.
fn sample_features(n_features: usize, mtry: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut all: Vec<usize> = (0..n_features).collect();
    for i in 0..mtry {
        let j = rng.gen_range(i..n_features);
        all.swap(i, j);
    }
    all.truncate(mtry);
    all
}

/// Held-out evaluation of binary predictions.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub test_rows: usize,
    pub test_positives: usize,
}

/// Compute accuracy/precision/recall/F1 for predictions against labels.
/// Undefined ratios (zero denominators) report as 0.
pub fn evaluate(predictions: &[bool], labels: &[bool]) -> TrainingMetrics {
    assert_eq!(predictions.len(), labels.len());

    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut tn = 0usize;
    let mut fneg = 0usize;
    for (&pred, &label) in predictions.iter().zip(labels) {
        match (pred, label) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fneg += 1,
        }
    }

    let total = predictions.len();
    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

    let accuracy = ratio(tp + tn, total);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fneg);
    let f1_score = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    TrainingMetrics {
        accuracy,
        precision,
        recall,
        f1_score,
        test_rows: total,
        test_positives: tp + fneg,
    }
}
