//! Rakshak Sentinel: live traffic anomaly feed for a home-network dashboard.
//!
//! Modular structure:
//! - [`collectors`]: Live capture, synthetic traffic, network discovery
//! - [`features`]: Raw packet → 3-dim feature vector
//! - [`model`]: Isolation forest scorer, fit once at startup
//! - [`feed`]: Bounded newest-first rolling window
//! - [`monitor`]: Producer tick: fetch, score, push
//! - [`notify`] / [`response`]: Webhook alerts, firewall mitigation
//! - [`logging`]: Structured logging

pub mod config;
pub mod error;
pub mod observation;
pub mod collectors;
pub mod features;
pub mod model;
pub mod feed;
pub mod monitor;
pub mod notify;
pub mod response;
pub mod logging;

pub use config::SentinelConfig;
pub use collectors::{PacketSource, RawPacket, SyntheticGenerator};
pub use features::{FeatureVector, FeatureExtractor};
pub use model::{Classification, Label, Scorer};
pub use observation::{Direction, Observation, Protocol, Status};
pub use feed::RollingFeed;
pub use monitor::TrafficMonitor;
pub use logging::StructuredLogger;
