//! Direction inference and feature encoding for a single raw packet.

use super::FeatureVector;
use crate::collectors::RawPacket;
use crate::config::FeaturesConfig;
use crate::error::FeatureError;
use crate::observation::Direction;

const LOCAL_LABEL: &str = "Local Network (Home)";

/// Map a remote address to a display location by prefix.
pub fn destination_label(ip: &str) -> &'static str {
    if ip.starts_with("192.168") || ip.starts_with("10.") {
        LOCAL_LABEL
    } else if ip.starts_with("172.") || ip.starts_with("142.") {
        "USA (Google/AWS)"
    } else if ip.starts_with("104.") || ip.starts_with("157.") {
        "USA (Cloudflare)"
    } else {
        "Internet (Public)"
    }
}

/// Everything derived from one packet that the monitor needs to build an observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub features: FeatureVector,
    pub direction: Direction,
    /// Address on the far side of the local subnet
    pub remote: String,
    pub size_kb: f64,
}

pub struct FeatureExtractor {
    config: FeaturesConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeaturesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeaturesConfig {
        &self.config
    }

    fn is_local(&self, addr: &str) -> bool {
        self.config
            .local_prefixes
            .iter()
            .any(|p| addr.starts_with(p.as_str()))
    }

    /// Upload when the source is local, download when only the destination is.
    pub fn resolve_direction(&self, src: &str, dst: &str) -> Result<(Direction, String), FeatureError> {
        if self.is_local(src) {
            Ok((Direction::Upload, dst.to_string()))
        } else if self.is_local(dst) {
            Ok((Direction::Download, src.to_string()))
        } else {
            Err(FeatureError::UnresolvedDirection {
                src: src.to_string(),
                dst: dst.to_string(),
            })
        }
    }

    pub fn extract(&self, packet: &RawPacket) -> Result<Extracted, FeatureError> {
        let size_kb = packet.size_kb();
        if !size_kb.is_finite() || size_kb < 0.0 {
            return Err(FeatureError::InvalidSize(size_kb));
        }
        let src = packet.src.to_string();
        let dst = packet.dst.to_string();
        let (direction, remote) = self.resolve_direction(&src, &dst)?;
        let code = direction.code().unwrap_or(0.0);
        Ok(Extracted {
            features: FeatureVector::new(size_kb, code, self.config.frequency),
            direction,
            remote,
            size_kb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Protocol;
    use std::net::{IpAddr, Ipv4Addr};

    fn packet(src: [u8; 4], dst: [u8; 4], len: usize) -> RawPacket {
        RawPacket {
            src: IpAddr::V4(Ipv4Addr::from(src)),
            dst: IpAddr::V4(Ipv4Addr::from(dst)),
            len,
            protocol: Protocol::Tcp,
        }
    }

    #[test]
    fn local_source_is_upload() {
        let ex = FeatureExtractor::new(FeaturesConfig::default());
        let out = ex.extract(&packet([192, 168, 1, 5], [142, 250, 1, 1], 2048)).unwrap();
        assert_eq!(out.direction, Direction::Upload);
        assert_eq!(out.remote, "142.250.1.1");
        assert_eq!(out.features.values, [2.0, 1.0, 10.0]);
    }

    #[test]
    fn local_destination_is_download() {
        let ex = FeatureExtractor::new(FeaturesConfig::default());
        let out = ex.extract(&packet([104, 16, 0, 1], [10, 0, 0, 7], 512)).unwrap();
        assert_eq!(out.direction, Direction::Download);
        assert_eq!(out.remote, "104.16.0.1");
        assert_eq!(out.features.values[1], 0.0);
    }

    #[test]
    fn no_local_endpoint_is_rejected() {
        let ex = FeatureExtractor::new(FeaturesConfig::default());
        let err = ex.extract(&packet([8, 8, 8, 8], [1, 1, 1, 1], 64)).unwrap_err();
        assert!(matches!(err, FeatureError::UnresolvedDirection { .. }));
    }

    #[test]
    fn labels_by_prefix() {
        assert_eq!(destination_label("192.168.0.10"), LOCAL_LABEL);
        assert_eq!(destination_label("10.1.2.3"), LOCAL_LABEL);
        assert_eq!(destination_label("142.250.64.78"), "USA (Google/AWS)");
        assert_eq!(destination_label("157.240.1.35"), "USA (Cloudflare)");
        assert_eq!(destination_label("8.8.8.8"), "Internet (Public)");
    }
}
