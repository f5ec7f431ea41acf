//! Synthetic training baseline: independent Gaussians around typical traffic.

use crate::config::ScorerConfig;
use crate::features::{FeatureVector, FEATURE_DIM};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Box-Muller draw from N(0, 1).
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// `training_samples` rows drawn from `baseline_mean ± baseline_std`, seeded.
pub fn gaussian_baseline(config: &ScorerConfig) -> Vec<FeatureVector> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.training_samples)
        .map(|_| {
            let mut v = [0.0; FEATURE_DIM];
            for (i, slot) in v.iter_mut().enumerate() {
                *slot = config.baseline_mean[i] + config.baseline_std[i] * standard_normal(&mut rng);
            }
            FeatureVector::from(v)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_seeded_and_centred() {
        let config = ScorerConfig::default();
        let a = gaussian_baseline(&config);
        let b = gaussian_baseline(&config);
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);

        let mean_size = a.iter().map(|f| f.size_kb()).sum::<f64>() / a.len() as f64;
        assert!((mean_size - 50.0).abs() < 5.0, "mean size {}", mean_size);
    }
}
