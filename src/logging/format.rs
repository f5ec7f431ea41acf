//! JSON log lines: one JSON object per line (ndjson) for the live table.

use crate::feed::{FeedSummary, SystemStatus};
use crate::observation::{Observation, Protocol, NONE_TEXT};
use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// One rendered row of the live traffic table plus the window's metrics.
#[derive(Serialize)]
pub struct FeedLine<'a> {
    pub time: String,
    pub device: &'a str,
    pub destination: &'a str,
    pub protocol: &'a str,
    pub status: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<&'a str>,
    pub threats: usize,
    pub system_status: &'a str,
}

impl<'a> FeedLine<'a> {
    pub fn new(observation: &'a Observation, summary: &FeedSummary) -> Self {
        let protocol = match observation.protocol() {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Unknown => "-",
        };
        let system_status = match summary.system_status {
            SystemStatus::Secure => "SECURE",
            SystemStatus::Compromised => "COMPROMISED",
        };
        Self {
            time: observation.time_of_day(),
            device: observation.device(),
            destination: observation.destination(),
            protocol,
            status: observation.status().to_string(),
            score: observation.score(),
            alert: (observation.alert() != NONE_TEXT).then(|| observation.alert()),
            threats: summary.threats,
            system_status,
        }
    }
}

/// Initialize tracing (JSON or plain text)
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber to stderr, level from RUST_LOG or default.
    /// Stdout is left to the feed lines.
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry().with(filter).with(fmt).init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    /// Emit a single structured line without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::RollingFeed;

    #[test]
    fn feed_line_is_one_json_object() {
        let feed = RollingFeed::new(4);
        let o = Observation::idle();
        feed.push(o.clone());
        let line = FeedLine::new(&o, &feed.summary());

        let mut out = Vec::new();
        StructuredLogger::emit_json(&line, &mut out);
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let v: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(v["status"], "IDLE");
        assert_eq!(v["system_status"], "SECURE");
        assert!(v.get("alert").is_none());
    }
}
