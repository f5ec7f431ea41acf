//! Webhook alerts for threat records. Fire-and-forget: delivery failures are
//! logged and reported as `false`, never propagated.

use crate::config::NotifyConfig;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_USERNAME: &str = "Cyber-Rakshak Sentinel";
const EMBED_COLOR_RED: u32 = 15_548_997;

/// Anything that can deliver a threat alert.
pub trait Notifier: Send + Sync {
    fn notify(&self, device: &str, destination: &str, score: f64) -> bool;
}

/// Sink used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _device: &str, _destination: &str, _score: f64) -> bool {
        false
    }
}

#[derive(Serialize)]
struct EmbedField {
    name: &'static str,
    value: String,
    inline: bool,
}

#[derive(Serialize)]
struct EmbedFooter {
    text: &'static str,
}

#[derive(Serialize)]
struct Embed {
    title: &'static str,
    description: &'static str,
    color: u32,
    fields: Vec<EmbedField>,
    footer: EmbedFooter,
}

/// Discord-compatible webhook body.
#[derive(Serialize)]
struct AlertPayload {
    username: String,
    embeds: Vec<Embed>,
}

fn alert_payload(username: &str, device: &str, destination: &str, score: f64) -> AlertPayload {
    AlertPayload {
        username: username.to_string(),
        embeds: vec![Embed {
            title: "RED ALERT: THREAT DETECTED",
            description: "**Anomaly Detected in IoT Network**",
            color: EMBED_COLOR_RED,
            fields: vec![
                EmbedField {
                    name: "Device",
                    value: device.to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Destination",
                    value: destination.to_string(),
                    inline: true,
                },
                EmbedField {
                    name: "Threat Score",
                    value: score.to_string(),
                    inline: false,
                },
            ],
            footer: EmbedFooter {
                text: "Action: Connection Severed | Admin Notified",
            },
        }],
    }
}

pub struct WebhookNotifier {
    client: reqwest::blocking::Client,
    url: String,
    username: String,
}

impl WebhookNotifier {
    /// `None` when no webhook URL is configured or the client cannot be built.
    pub fn new(config: &NotifyConfig) -> Option<Self> {
        let url = config.webhook_url.as_ref()?.trim().to_string();
        if url.is_empty() {
            return None;
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .connect_timeout(Duration::from_secs(3))
            .build()
            .ok()?;
        Some(Self {
            client,
            url,
            username: config
                .username
                .clone()
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
        })
    }

    fn post(&self, body: &AlertPayload) -> Result<(), String> {
        let res = self
            .client
            .post(&self.url)
            .json(body)
            .send()
            .map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            return Err(res.status().to_string());
        }
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, device: &str, destination: &str, score: f64) -> bool {
        let payload = alert_payload(&self.username, device, destination, score);
        match self.post(&payload) {
            Ok(()) => {
                info!(device, destination, score, "threat alert delivered");
                true
            }
            Err(e) => {
                warn!(device, destination, error = %e, "threat alert failed");
                false
            }
        }
    }
}

/// Webhook notifier when configured, otherwise a no-op sink.
pub fn from_config(config: &NotifyConfig) -> Box<dyn Notifier> {
    match WebhookNotifier::new(config) {
        Some(n) => Box::new(n),
        None => Box::new(NoopNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_fields() {
        let p = alert_payload(DEFAULT_USERNAME, "Smart Bulb (IoT)", "Unknown (China Server)", -0.95);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["username"], DEFAULT_USERNAME);
        let fields = &json["embeds"][0]["fields"];
        assert_eq!(fields[0]["value"], "Smart Bulb (IoT)");
        assert_eq!(fields[1]["value"], "Unknown (China Server)");
        assert_eq!(fields[2]["value"], "-0.95");
    }

    #[test]
    fn unconfigured_webhook_is_disabled() {
        assert!(WebhookNotifier::new(&NotifyConfig::default()).is_none());
        let blank = NotifyConfig {
            webhook_url: Some("  ".into()),
            username: None,
        };
        assert!(WebhookNotifier::new(&blank).is_none());
    }

    #[test]
    fn unreachable_webhook_is_swallowed() {
        let config = NotifyConfig {
            webhook_url: Some("http://127.0.0.1:9/hook".into()),
            username: None,
        };
        let n = WebhookNotifier::new(&config).unwrap();
        assert!(!n.notify("dev", "dst", -0.9));
    }
}
