//! Isolation forest. Anomalies are isolated by fewer random axis splits, so
//! their average path length across trees is short.

use super::{baseline, Classification, Label};
use crate::config::ScorerConfig;
use crate::error::{Result, ScorerError};
use crate::features::{FeatureVector, FEATURE_DIM};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
/// Keeps forest randomness independent of the baseline stream for the same seed.
const FOREST_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in [0, 100].
fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn build(data: &Array2<f64>, rows: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(data, rows, 0, max_depth, rng);
        tree
    }

    fn grow(
        &mut self,
        data: &Array2<f64>,
        rows: Vec<usize>,
        depth: usize,
        max_depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });
        if depth >= max_depth || rows.len() <= 1 {
            return idx;
        }

        // Only features that still vary inside this node can split it.
        let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
            .filter_map(|f| {
                let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                    let v = data[[r, f]];
                    (lo.min(v), hi.max(v))
                });
                (hi > lo).then_some((f, lo, hi))
            })
            .collect();
        if candidates.is_empty() {
            return idx;
        }

        let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
        let threshold = rng.gen_range(lo..hi);
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            rows.into_iter().partition(|&r| data[[r, feature]] < threshold);

        let left = self.grow(data, left_rows, depth + 1, max_depth, rng);
        let right = self.grow(data, right_rows, depth + 1, max_depth, rng);
        self.nodes[idx] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        idx
    }

    fn path_length(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Fitted scorer state. Immutable after [`Scorer::fit`]; share it with `Arc`.
#[derive(Debug, Clone)]
pub struct Scorer {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    offset: f64,
}

impl Scorer {
    /// Fit on unlabeled training rows. The decision offset is the
    /// `contamination` percentile of the training scores.
    pub fn fit(training: &[FeatureVector], config: &ScorerConfig) -> Result<Self> {
        if training.is_empty() {
            return Err(ScorerError::InvalidTraining("empty training set".into()));
        }
        if config.n_trees == 0 {
            return Err(ScorerError::InvalidTraining("n_trees must be positive".into()));
        }
        if !(config.contamination > 0.0 && config.contamination <= 0.5) {
            return Err(ScorerError::InvalidTraining(format!(
                "contamination {} outside (0, 0.5]",
                config.contamination
            )));
        }
        if let Some(bad) = training.iter().find(|fv| fv.values.iter().any(|v| !v.is_finite())) {
            return Err(ScorerError::InvalidTraining(format!("non-finite row {:?}", bad.values)));
        }

        let n = training.len();
        let flat: Vec<f64> = training.iter().flat_map(|fv| fv.values).collect();
        let data = Array2::from_shape_vec((n, FEATURE_DIM), flat)
            .map_err(|e| ScorerError::InvalidTraining(e.to_string()))?;

        let sample_size = config.max_samples.clamp(1, n);
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(config.seed ^ FOREST_SEED_SALT);
        let trees = (0..config.n_trees)
            .map(|_| {
                let rows = index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::build(&data, rows, max_depth, &mut rng)
            })
            .collect();

        let mut scorer = Self {
            trees,
            sample_size,
            offset: 0.0,
        };
        let train_scores: Vec<f64> = training.iter().map(|fv| scorer.raw_score(fv.as_slice())).collect();
        scorer.offset = percentile(&train_scores, config.contamination * 100.0);
        tracing::debug!(
            trees = scorer.trees.len(),
            sample_size,
            offset = scorer.offset,
            "isolation forest fitted"
        );
        Ok(scorer)
    }

    /// Generate the configured Gaussian baseline and fit on it.
    pub fn fit_baseline(config: &ScorerConfig) -> Result<Self> {
        Self::fit(&baseline::gaussian_baseline(config), config)
    }

    /// `-2^(-E[h(x)] / c(ψ))`, in [-1, 0); near -1 is anomalous.
    fn raw_score(&self, x: &[f64]) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        let norm = average_path_length(self.sample_size).max(1.0);
        -(2f64.powf(-mean_path / norm))
    }

    /// Classify one feature slice. Rejects any slice that is not exactly
    /// [`FEATURE_DIM`] finite values.
    pub fn classify(&self, features: &[f64]) -> Result<Classification> {
        if features.len() != FEATURE_DIM {
            return Err(ScorerError::DimensionMismatch {
                expected: FEATURE_DIM,
                got: features.len(),
            });
        }
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(ScorerError::NonFinite(i));
        }
        let score = self.raw_score(features) - self.offset;
        let label = if score < 0.0 { Label::Anomalous } else { Label::Normal };
        Ok(Classification { label, score })
    }

    /// Decision offset subtracted from raw scores.
    pub fn offset(&self) -> f64 {
        self.offset
    }
}
