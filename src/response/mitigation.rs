//! Block a remote address with the OS firewall. Anything short of a confirmed
//! rule comes back as `Simulated`; callers never see an error.

use crate::config::MitigationConfig;
use crate::error::MitigationError;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::process::Command;
use tracing::{info, warn};

/// Stands in for targets that are labels rather than addresses (TEST-NET-3).
pub const FALLBACK_TARGET: &str = "203.0.113.66";
const RULE_COMMENT: &str = "rakshak-sentinel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MitigationStatus {
    Blocked,
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationOutcome {
    pub status: MitigationStatus,
    /// Address actually acted on
    pub target: IpAddr,
    pub message: String,
}

pub struct Mitigator {
    config: MitigationConfig,
}

impl Mitigator {
    pub fn new(config: MitigationConfig) -> Self {
        Self { config }
    }

    /// Parse `target`, substituting [`FALLBACK_TARGET`] for anything that is not an IP.
    pub fn resolve_target(target: &str) -> IpAddr {
        target.trim().parse().unwrap_or_else(|_| {
            warn!(requested = target, fallback = FALLBACK_TARGET, "unparseable target; using fallback address");
            IpAddr::from([203, 0, 113, 66])
        })
    }

    pub fn sever_connection(&self, target: &str) -> MitigationOutcome {
        let ip = Self::resolve_target(target);
        if !self.config.enforce {
            return MitigationOutcome {
                status: MitigationStatus::Simulated,
                target: ip,
                message: format!("Simulated block of {}", ip),
            };
        }
        match block(ip) {
            Ok(()) => {
                info!(addr = %ip, "firewall rule added");
                MitigationOutcome {
                    status: MitigationStatus::Blocked,
                    target: ip,
                    message: format!("Blocked outbound traffic to {}", ip),
                }
            }
            Err(e) => {
                warn!(addr = %ip, error = %e, "firewall block failed; simulating");
                MitigationOutcome {
                    status: MitigationStatus::Simulated,
                    target: ip,
                    message: format!("Simulated block of {} ({})", ip, e),
                }
            }
        }
    }
}

#[cfg_attr(not(any(target_os = "linux", target_os = "windows")), allow(dead_code))]
fn run(command: &str, args: &[String]) -> Result<(), MitigationError> {
    let output = Command::new(command).args(args).output()?;
    if output.status.success() {
        Ok(())
    } else {
        Err(MitigationError::CommandFailed {
            command: command.to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(target_os = "linux")]
fn block(ip: IpAddr) -> Result<(), MitigationError> {
    let tool = if ip.is_ipv6() { "ip6tables" } else { "iptables" };
    let addr = ip.to_string();
    let args: Vec<String> = [
        "-I", "OUTPUT", "-d", addr.as_str(), "-j", "DROP", "-m", "comment", "--comment", RULE_COMMENT,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    run(tool, &args)
}

#[cfg(target_os = "windows")]
fn block(ip: IpAddr) -> Result<(), MitigationError> {
    let args = [
        "advfirewall".to_string(),
        "firewall".to_string(),
        "add".to_string(),
        "rule".to_string(),
        format!("name={}_{}", RULE_COMMENT, ip),
        "dir=out".to_string(),
        format!("remoteip={}", ip),
        "action=block".to_string(),
        "enable=yes".to_string(),
    ];
    run("netsh", &args)
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn block(_ip: IpAddr) -> Result<(), MitigationError> {
    Err(MitigationError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_target_uses_fallback() {
        let m = Mitigator::new(MitigationConfig::default());
        let out = m.sever_connection("Unknown (China Server)");
        assert_eq!(out.target.to_string(), FALLBACK_TARGET);
        assert_eq!(out.status, MitigationStatus::Simulated);
    }

    #[test]
    fn address_target_is_kept() {
        assert_eq!(Mitigator::resolve_target(" 198.51.100.7 ").to_string(), "198.51.100.7");
        assert_eq!(Mitigator::resolve_target("2001:db8::1").to_string(), "2001:db8::1");
    }

    #[test]
    fn missing_tool_is_an_error() {
        let err = run("rakshak-no-such-firewall-tool", &[]).unwrap_err();
        assert!(matches!(err, MitigationError::Io(_)));
    }
}
