//! Producer side of the feed: one observation per tick from live capture, an
//! injected attack, or the synthetic fallback, scored and pushed.

use crate::collectors::{LiveCapture, NoCapture, PacketSource, RawPacket, SyntheticGenerator};
use crate::config::{CaptureConfig, FallbackMode, SentinelConfig, SimulationConfig};
use crate::error::ScorerError;
use crate::features::{destination_label, FeatureExtractor};
use crate::feed::RollingFeed;
use crate::model::Scorer;
use crate::notify::{self, Notifier};
use crate::observation::{Direction, Observation, Traffic};
use crate::response::{forensic_report, MitigationOutcome, Mitigator};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct TrafficMonitor {
    source: Box<dyn PacketSource>,
    extractor: FeatureExtractor,
    scorer: Arc<Scorer>,
    generator: Mutex<SyntheticGenerator>,
    feed: Arc<RollingFeed>,
    notifier: Box<dyn Notifier>,
    mitigator: Mitigator,
    capture: CaptureConfig,
    simulation: SimulationConfig,
    active_attack: Mutex<Option<Observation>>,
    /// Captured packets not yet turned into observations, oldest first
    pending: Mutex<VecDeque<RawPacket>>,
    capture_warned: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl TrafficMonitor {
    pub fn new(
        config: &SentinelConfig,
        scorer: Arc<Scorer>,
        source: Box<dyn PacketSource>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        let generator = SyntheticGenerator::new(
            &config.scorer,
            config.features.frequency,
            config.simulation.seed,
        );
        Self {
            source,
            extractor: FeatureExtractor::new(config.features.clone()),
            scorer,
            generator: Mutex::new(generator),
            feed: Arc::new(RollingFeed::new(config.feed.capacity)),
            notifier,
            mitigator: Mitigator::new(config.mitigation.clone()),
            capture: config.capture.clone(),
            simulation: config.simulation.clone(),
            active_attack: Mutex::new(None),
            pending: Mutex::new(VecDeque::new()),
            capture_warned: AtomicBool::new(false),
        }
    }

    /// Fit the scorer on the configured baseline and wire collaborators from config.
    ///
    /// With a webhook configured the monitor owns a blocking HTTP client: build
    /// and drop it outside async worker threads (e.g. in `spawn_blocking`).
    pub fn from_config(config: &SentinelConfig) -> Result<Self, ScorerError> {
        let scorer = Arc::new(Scorer::fit_baseline(&config.scorer)?);
        info!(offset = scorer.offset(), "anomaly scorer ready");
        let source: Box<dyn PacketSource> = if config.capture.enabled {
            Box::new(LiveCapture::new(config.capture.interface.clone()))
        } else {
            Box::new(NoCapture)
        };
        Ok(Self::new(config, scorer, source, notify::from_config(&config.notify)))
    }

    pub fn feed(&self) -> &Arc<RollingFeed> {
        &self.feed
    }

    pub fn scorer(&self) -> &Arc<Scorer> {
        &self.scorer
    }

    fn capture_batch(&self) -> Vec<RawPacket> {
        let timeout = Duration::from_millis(self.capture.timeout_ms);
        match self.source.try_capture(self.capture.max_count, timeout) {
            Ok(packets) => packets,
            Err(e) => {
                if !self.capture_warned.swap(true, Ordering::Relaxed) {
                    warn!(error = %e, "live capture unavailable; using fallback");
                } else {
                    debug!(error = %e, "live capture unavailable");
                }
                Vec::new()
            }
        }
    }

    /// One packet per tick; a batch is captured only once the previous one is used up.
    fn next_packet(&self) -> Option<RawPacket> {
        let mut pending = lock(&self.pending);
        if pending.is_empty() {
            pending.extend(self.capture_batch());
        }
        pending.pop_front()
    }

    /// Live packets go through the same scorer as synthetic traffic. Packets whose
    /// direction cannot be inferred are kept but marked idle, unscored.
    pub fn observe_packet(&self, packet: &RawPacket) -> Observation {
        let device = self.extractor.config().device_label.clone();
        match self.extractor.extract(packet) {
            Ok(ex) => {
                let traffic = Traffic {
                    device,
                    destination: destination_label(&ex.remote).to_string(),
                    size_kb: ex.size_kb,
                    direction: ex.direction,
                    protocol: packet.protocol,
                };
                match self.scorer.classify(ex.features.as_slice()) {
                    Ok(c) => Observation::scored(traffic, c),
                    Err(e) => {
                        warn!(error = %e, "packet not scorable");
                        Observation::low_confidence(traffic)
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "low-confidence packet");
                Observation::low_confidence(Traffic {
                    device,
                    destination: destination_label(&packet.dst.to_string()).to_string(),
                    size_kb: packet.size_kb(),
                    direction: Direction::Unknown,
                    protocol: packet.protocol,
                })
            }
        }
    }

    /// Never fails: an injected attack replay, a captured packet, or the fallback.
    pub fn get_next_observation(&self) -> Observation {
        if let Some(attack) = self.active_attack() {
            if lock(&self.generator).chance(self.simulation.attack_repeat_probability) {
                return attack.restamped();
            }
        }

        if let Some(packet) = self.next_packet() {
            return self.observe_packet(&packet);
        }

        let mut generator = lock(&self.generator);
        match self.simulation.fallback {
            FallbackMode::Idle => generator.next_idle(),
            FallbackMode::Synthetic => generator.next_normal(&self.scorer),
        }
    }

    /// One producer step: fetch, score, push. Returns what was pushed.
    pub fn tick(&self) -> Observation {
        let observation = self.get_next_observation();
        self.feed.push(observation.clone());
        observation
    }

    /// Start replaying a simulated attack and raise an alert for it.
    pub fn inject_attack(&self) -> Observation {
        let attack = lock(&self.generator).next_attack();
        *lock(&self.active_attack) = Some(attack.clone());
        warn!(
            device = attack.device(),
            destination = attack.destination(),
            score = attack.score(),
            "simulated attack injected"
        );
        self.notifier
            .notify(attack.device(), attack.destination(), attack.score());
        attack
    }

    pub fn active_attack(&self) -> Option<Observation> {
        lock(&self.active_attack).clone()
    }

    /// Report for the active attack, if any.
    pub fn attack_report(&self) -> Option<String> {
        self.active_attack().map(|a| forensic_report(&a))
    }

    /// Block the active attack's destination and stop replaying it.
    pub fn engage_kill_switch(&self) -> Option<MitigationOutcome> {
        let attack = lock(&self.active_attack).take()?;
        let outcome = self.mitigator.sever_connection(attack.destination());
        info!(addr = %outcome.target, status = ?outcome.status, "kill switch engaged");
        Some(outcome)
    }
}
