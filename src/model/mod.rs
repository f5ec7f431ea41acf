//! Unsupervised anomaly scorer: an isolation forest fit once on a synthetic
//! "normal" baseline, read-only afterwards.

mod baseline;
mod isolation;

pub use baseline::{gaussian_baseline, standard_normal};
pub use isolation::Scorer;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Normal,
    Anomalous,
}

/// Scorer output. Lower score = more anomalous; negative means outside the
/// fitted decision boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    pub score: f64,
}

impl Classification {
    pub fn is_anomalous(&self) -> bool {
        self.label == Label::Anomalous
    }
}
