//! Scored traffic observations: the unit the feed stores and the dashboard renders.

use crate::model::{Classification, Label};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Placeholder for empty text fields.
pub const NONE_TEXT: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Upload,
    Download,
    Unknown,
}

impl Direction {
    /// Model encoding; `None` for an unresolved direction.
    pub fn code(self) -> Option<f64> {
        match self {
            Direction::Upload => Some(1.0),
            Direction::Download => Some(0.0),
            Direction::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    Unknown,
}

impl Protocol {
    /// Map an IP protocol number.
    pub fn from_ip_number(n: u8) -> Self {
        match n {
            6 => Protocol::Tcp,
            17 => Protocol::Udp,
            _ => Protocol::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Safe,
    Suspicious,
    Threat,
    Idle,
}

impl Status {
    pub fn from_label(label: Label) -> Self {
        match label {
            Label::Normal => Status::Safe,
            Label::Anomalous => Status::Suspicious,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Safe => "SAFE",
            Status::Suspicious => "CHECK",
            Status::Threat => "THREAT",
            Status::Idle => "IDLE",
        };
        f.write_str(s)
    }
}

/// One scored unit of traffic, real or synthetic. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    id: String,
    ts: DateTime<Utc>,
    device: String,
    destination: String,
    size_kb: f64,
    direction: Direction,
    protocol: Protocol,
    status: Status,
    score: f64,
    alert: String,
}

/// Traffic fields shared by every constructor.
#[derive(Debug, Clone)]
pub struct Traffic {
    pub device: String,
    pub destination: String,
    pub size_kb: f64,
    pub direction: Direction,
    pub protocol: Protocol,
}

impl Observation {
    fn build(traffic: Traffic, status: Status, score: f64, alert: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ts: Utc::now(),
            device: traffic.device,
            destination: traffic.destination,
            size_kb: traffic.size_kb.max(0.0),
            direction: traffic.direction,
            protocol: traffic.protocol,
            status,
            score,
            alert: alert.to_string(),
        }
    }

    /// Status and score both come from the scorer.
    pub fn scored(traffic: Traffic, classification: Classification) -> Self {
        Self::build(
            traffic,
            Status::from_label(classification.label),
            classification.score,
            NONE_TEXT,
        )
    }

    /// Explicit override for simulated attacks; bypasses the scorer.
    pub fn forced_threat(traffic: Traffic, score: f64, alert: &str) -> Self {
        Self::build(traffic, Status::Threat, score, alert)
    }

    /// Traffic seen but not scored (direction could not be inferred).
    pub fn low_confidence(traffic: Traffic) -> Self {
        Self::build(traffic, Status::Idle, 0.0, NONE_TEXT)
    }

    /// Nothing observed this tick.
    pub fn idle() -> Self {
        Self::build(
            Traffic {
                device: "Network Idle".to_string(),
                destination: NONE_TEXT.to_string(),
                size_kb: 0.0,
                direction: Direction::Unknown,
                protocol: Protocol::Unknown,
            },
            Status::Idle,
            0.0,
            NONE_TEXT,
        )
    }

    /// Same record with a fresh id and timestamp (replaying an injected attack).
    pub fn restamped(&self) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            ts: Utc::now(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    /// Local wall-clock `HH:MM:SS`, as shown in the live table.
    pub fn time_of_day(&self) -> String {
        self.ts.with_timezone(&Local).format("%H:%M:%S").to_string()
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn size_kb(&self) -> f64 {
        self.size_kb
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn alert(&self) -> &str {
        &self.alert
    }

    pub fn is_threat(&self) -> bool {
        self.status == Status::Threat
    }
}
