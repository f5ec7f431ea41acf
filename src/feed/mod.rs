//! Rolling feed: the bounded, newest-first window the dashboard polls.

use crate::observation::{Observation, Status};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_CAPACITY: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Secure,
    Compromised,
}

/// Counts over the current window, for the metrics row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSummary {
    pub total: usize,
    pub safe: usize,
    pub suspicious: usize,
    pub threats: usize,
    pub idle: usize,
    pub system_status: SystemStatus,
}

/// One point on the anomaly-score chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub timestamp: String,
    pub score: f64,
}

pub struct RollingFeed {
    capacity: usize,
    buf: Mutex<VecDeque<Observation>>,
}

impl Default for RollingFeed {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RollingFeed {
    /// A zero capacity is raised to 1 so the latest observation is always visible.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buf: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    // Observations are immutable, so a poisoned buffer is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Observation>> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Prepend; evicts the oldest entry once full.
    pub fn push(&self, observation: Observation) {
        let mut buf = self.lock();
        buf.push_front(observation);
        buf.truncate(self.capacity);
    }

    /// Newest-first copy of the window.
    pub fn snapshot(&self) -> Vec<Observation> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<Observation> {
        self.lock().front().cloned()
    }

    pub fn summary(&self) -> FeedSummary {
        let buf = self.lock();
        let count = |s: Status| buf.iter().filter(|o| o.status() == s).count();
        let threats = count(Status::Threat);
        FeedSummary {
            total: buf.len(),
            safe: count(Status::Safe),
            suspicious: count(Status::Suspicious),
            threats,
            idle: count(Status::Idle),
            system_status: if threats > 0 {
                SystemStatus::Compromised
            } else {
                SystemStatus::Secure
            },
        }
    }

    /// Oldest-first `(time, score)` series for charting.
    pub fn trend(&self) -> Vec<TrendPoint> {
        self.lock()
            .iter()
            .rev()
            .map(|o| TrendPoint {
                timestamp: o.time_of_day(),
                score: o.score(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_when_full() {
        let feed = RollingFeed::new(3);
        let pushed: Vec<Observation> = (0..5).map(|_| Observation::idle()).collect();
        for o in &pushed {
            feed.push(o.clone());
        }
        let snap = feed.snapshot();
        assert_eq!(snap.len(), 3);
        let ids: Vec<&str> = snap.iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![pushed[4].id(), pushed[3].id(), pushed[2].id()]);
    }

    #[test]
    fn zero_capacity_keeps_latest() {
        let feed = RollingFeed::new(0);
        feed.push(Observation::idle());
        let last = Observation::idle();
        feed.push(last.clone());
        assert_eq!(feed.capacity(), 1);
        assert_eq!(feed.snapshot(), vec![last]);
    }

    #[test]
    fn trend_is_oldest_first() {
        let feed = RollingFeed::new(5);
        let first = Observation::idle();
        feed.push(first.clone());
        feed.push(Observation::idle());
        let trend = feed.trend();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].timestamp, first.time_of_day());
    }

    #[test]
    fn empty_summary_is_secure() {
        let s = RollingFeed::default().summary();
        assert_eq!(s.total, 0);
        assert_eq!(s.system_status, SystemStatus::Secure);
    }
}
