//! Sentinel configuration. Loaded from JSON; every section has defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    /// Rolling feed size and producer cadence
    pub feed: FeedConfig,
    /// Live capture adapter
    pub capture: CaptureConfig,
    /// Feature extraction parameters
    pub features: FeaturesConfig,
    /// Isolation forest parameters and training baseline
    pub scorer: ScorerConfig,
    /// Synthetic traffic and attack injection
    pub simulation: SimulationConfig,
    /// Webhook alerts
    pub notify: NotifyConfig,
    /// Firewall mitigation
    pub mitigation: MitigationConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Max observations kept, newest first
    pub capacity: usize,
    /// Producer tick (milliseconds)
    pub tick_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub enabled: bool,
    /// Interface to bind; all interfaces when unset
    pub interface: Option<String>,
    /// Packets requested per tick
    pub max_count: usize,
    /// Receive timeout per tick (milliseconds, clamped to 1000)
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Address prefixes treated as the local subnet
    pub local_prefixes: Vec<String>,
    /// Frequency placeholder fed as the third feature
    pub frequency: f64,
    /// Device label for live-captured traffic
    pub device_label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    pub n_trees: usize,
    /// Subsample size per tree (capped at training size)
    pub max_samples: usize,
    /// Expected share of outliers; sets the decision offset
    pub contamination: f64,
    pub seed: u64,
    /// Baseline rows generated for fitting
    pub training_samples: usize,
    pub baseline_mean: [f64; 3],
    pub baseline_std: [f64; 3],
}

/// What the producer emits when capture yields nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    Idle,
    Synthetic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub fallback: FallbackMode,
    /// While an attack is injected, chance per tick that it replays
    pub attack_repeat_probability: f64,
    /// Fixed seed for reproducible synthetic traffic
    pub seed: Option<u64>,
    /// Inject a simulated attack on this tick (demo mode)
    pub attack_at_tick: Option<u64>,
    /// Engage the kill switch this many ticks after an injection
    pub kill_switch_after_ticks: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Discord-compatible webhook; alerts disabled when unset
    pub webhook_url: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MitigationConfig {
    /// Run real firewall commands; otherwise every block is simulated
    pub enforce: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            capacity: 30,
            tick_ms: 1500,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interface: None,
            max_count: 1,
            timeout_ms: 100,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            local_prefixes: vec!["192.168.".to_string(), "10.".to_string()],
            frequency: 10.0,
            device_label: "My Laptop".to_string(),
        }
    }
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
            training_samples: 100,
            baseline_mean: [50.0, 0.0, 10.0],
            baseline_std: [10.0, 0.5, 2.0],
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fallback: FallbackMode::Idle,
            attack_repeat_probability: 0.6,
            seed: None,
            attack_at_tick: None,
            kill_switch_after_ticks: None,
        }
    }
}

impl SimulationConfig {
    /// Whether the kill switch fires on `tick` for an attack injected on `injected_at`.
    pub fn kill_switch_due(&self, injected_at: u64, tick: u64) -> bool {
        self.kill_switch_after_ticks
            .and_then(|after| injected_at.checked_add(after))
            == Some(tick)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SentinelConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "config unreadable; using defaults");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
