//! Synthetic traffic for demos and for when live capture has nothing to offer.

use crate::config::ScorerConfig;
use crate::features::{destination_label, FeatureVector};
use crate::model::{standard_normal, Scorer};
use crate::observation::{Direction, Observation, Protocol, Traffic};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const DEVICES: &[&str] = &["My Laptop", "Phone", "Smart TV", "Tablet", "Smart Bulb (IoT)"];
/// First two octets of plausible remote hosts.
const REMOTE_PREFIXES: &[[u8; 2]] = &[
    [142, 250],
    [172, 217],
    [104, 16],
    [157, 240],
    [192, 168],
    [52, 84],
    [8, 8],
];
const MAX_NORMAL_DRAWS: usize = 8;
/// Normal traffic is drawn tighter than the training spread.
const NORMAL_SPREAD: f64 = 0.5;

pub const ATTACK_DEVICE: &str = "Smart Bulb (IoT)";
pub const ATTACK_DESTINATION: &str = "Unknown (China Server)";
pub const ATTACK_SIZE_KB: f64 = 0.5;
pub const ATTACK_SCORE: f64 = -0.95;
pub const ATTACK_ALERT: &str = "Lateral Movement Detected!";

pub struct SyntheticGenerator {
    rng: StdRng,
    size_mean: f64,
    size_std: f64,
    frequency: f64,
}

impl SyntheticGenerator {
    /// Draws sizes around the scorer's baseline; `seed` makes the stream reproducible.
    pub fn new(baseline: &ScorerConfig, frequency: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            size_mean: baseline.baseline_mean[0],
            size_std: baseline.baseline_std[0],
            frequency,
        }
    }

    fn random_remote(&mut self) -> String {
        let prefix = REMOTE_PREFIXES.choose(&mut self.rng).copied().unwrap_or([8, 8]);
        format!(
            "{}.{}.{}.{}",
            prefix[0],
            prefix[1],
            self.rng.gen_range(0..=255u8),
            self.rng.gen_range(1..=254u8)
        )
    }

    fn traffic(&mut self, size_kb: f64) -> Traffic {
        let remote = self.random_remote();
        let protocol = if self.rng.gen_bool(0.7) { Protocol::Tcp } else { Protocol::Udp };
        Traffic {
            device: DEVICES.choose(&mut self.rng).copied().unwrap_or("My Laptop").to_string(),
            destination: destination_label(&remote).to_string(),
            size_kb,
            direction: Direction::Download,
            protocol,
        }
    }

    /// Ordinary download traffic, scored by `scorer`. Draws the scorer flags are
    /// re-drawn; after a few misses the baseline centroid is used, and if even
    /// that is flagged the tick is idle.
    pub fn next_normal(&mut self, scorer: &Scorer) -> Observation {
        for _ in 0..MAX_NORMAL_DRAWS {
            let size = (self.size_mean + self.size_std * NORMAL_SPREAD * standard_normal(&mut self.rng)).max(0.0);
            let features = FeatureVector::new(size, 0.0, self.frequency);
            if let Ok(c) = scorer.classify(features.as_slice()) {
                if !c.is_anomalous() {
                    return Observation::scored(self.traffic(size), c);
                }
            }
        }
        let centroid = FeatureVector::new(self.size_mean, 0.0, self.frequency);
        match scorer.classify(centroid.as_slice()) {
            Ok(c) if !c.is_anomalous() => Observation::scored(self.traffic(self.size_mean), c),
            Ok(c) => {
                tracing::warn!(score = c.score, "baseline centroid flagged by scorer");
                self.next_idle()
            }
            Err(e) => {
                tracing::warn!(error = %e, "baseline centroid not scorable");
                self.next_idle()
            }
        }
    }

    /// Simulated lateral-movement beacon. Fixed shape so consumers can rely on it.
    pub fn next_attack(&self) -> Observation {
        Observation::forced_threat(
            Traffic {
                device: ATTACK_DEVICE.to_string(),
                destination: ATTACK_DESTINATION.to_string(),
                size_kb: ATTACK_SIZE_KB,
                direction: Direction::Upload,
                protocol: Protocol::Tcp,
            },
            ATTACK_SCORE,
            ATTACK_ALERT,
        )
    }

    pub fn next_idle(&self) -> Observation {
        Observation::idle()
    }

    /// Bernoulli draw on the generator's stream.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Status;

    fn generator() -> SyntheticGenerator {
        SyntheticGenerator::new(&ScorerConfig::default(), 10.0, Some(7))
    }

    #[test]
    fn attack_has_fixed_shape() {
        let a = generator().next_attack();
        assert_eq!(a.status(), Status::Threat);
        assert_eq!(a.device(), ATTACK_DEVICE);
        assert_eq!(a.destination(), ATTACK_DESTINATION);
        assert_eq!(a.direction(), Direction::Upload);
        assert_eq!(a.size_kb(), ATTACK_SIZE_KB);
        assert!(a.score() < -0.5);
        assert_ne!(a.alert(), "-");
    }

    #[test]
    fn idle_is_blank() {
        let i = generator().next_idle();
        assert_eq!(i.status(), Status::Idle);
        assert_eq!(i.score(), 0.0);
        assert_eq!(i.destination(), "-");
        assert_eq!(i.direction(), Direction::Unknown);
        assert_eq!(i.protocol(), Protocol::Unknown);
    }

    #[test]
    fn normal_is_safe_and_scored() {
        let scorer = Scorer::fit_baseline(&ScorerConfig::default()).unwrap();
        let mut g = generator();
        for _ in 0..20 {
            let o = g.next_normal(&scorer);
            assert_eq!(o.status(), Status::Safe);
            assert!(o.score() >= 0.0 && o.score() < 0.5, "score {}", o.score());
            assert_eq!(o.alert(), "-");
        }
    }

    #[test]
    fn mismatched_scorer_never_yields_suspicious() {
        let shifted = ScorerConfig {
            baseline_mean: [500.0, 0.0, 10.0],
            baseline_std: [5.0, 0.5, 2.0],
            ..ScorerConfig::default()
        };
        let scorer = Scorer::fit_baseline(&shifted).unwrap();
        assert!(scorer.classify(&[50.0, 0.0, 10.0]).unwrap().is_anomalous());

        let mut g = generator();
        for _ in 0..5 {
            assert_eq!(g.next_normal(&scorer).status(), Status::Idle);
        }
    }

    #[test]
    fn seeded_streams_repeat() {
        let scorer = Scorer::fit_baseline(&ScorerConfig::default()).unwrap();
        let a = generator().next_normal(&scorer);
        let b = generator().next_normal(&scorer);
        assert_eq!(a.size_kb(), b.size_kb());
        assert_eq!(a.destination(), b.destination());
    }
}
