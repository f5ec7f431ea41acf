//! Feature extraction: raw packets → fixed 3-dim vectors for the scorer.

mod extractor;

pub use extractor::{destination_label, Extracted, FeatureExtractor};

use serde::{Deserialize, Serialize};

/// Number of features the scorer is fit on.
pub const FEATURE_DIM: usize = 3;

/// `(size_kb, direction_code, frequency)`, in the order the scorer was fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub values: [f64; FEATURE_DIM],
}

impl FeatureVector {
    pub fn new(size_kb: f64, direction_code: f64, frequency: f64) -> Self {
        Self {
            values: [size_kb, direction_code, frequency],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn size_kb(&self) -> f64 {
        self.values[0]
    }
}

impl From<[f64; FEATURE_DIM]> for FeatureVector {
    fn from(values: [f64; FEATURE_DIM]) -> Self {
        Self { values }
    }
}
