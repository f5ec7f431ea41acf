//! Traffic sources: live capture, synthetic generation, and network discovery.
//! Live sources report failures as errors; the caller picks the fallback.

mod capture;
mod discovery;
mod synthetic;

pub use capture::{capture_timeout, parse_ethernet_frame, LiveCapture, NoCapture, MAX_CAPTURE_TIMEOUT};
pub use discovery::{discover_devices, parse_arp_table, synthetic_devices, DiscoveredDevice};
pub use synthetic::SyntheticGenerator;

use crate::error::CaptureError;
use crate::observation::Protocol;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Minimal packet record handed to the feature extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPacket {
    pub src: IpAddr,
    pub dst: IpAddr,
    /// Frame length in bytes
    pub len: usize,
    pub protocol: Protocol,
}

impl RawPacket {
    pub fn size_kb(&self) -> f64 {
        self.len as f64 / 1024.0
    }
}

/// Anything that can hand the producer a short batch of packets per tick.
pub trait PacketSource: Send + Sync {
    /// Return at most `max_count` packets, blocking no longer than `timeout`.
    fn try_capture(&self, max_count: usize, timeout: Duration) -> Result<Vec<RawPacket>, CaptureError>;
}
