//! Rakshak Sentinel entrypoint: fits the scorer, then runs the producer tick
//! until Ctrl+C, printing each tick's row as one JSON line on stdout.

use rakshak_sentinel::{
    collectors::discover_devices,
    config::SentinelConfig,
    logging::{FeedLine, StructuredLogger},
    monitor::TrafficMonitor,
    observation::Observation,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const MIN_TICK_MS: u64 = 100;

fn render(monitor: &TrafficMonitor, observation: &Observation) {
    let summary = monitor.feed().summary();
    let line = FeedLine::new(observation, &summary);
    StructuredLogger::emit_json(&line, &mut std::io::stdout().lock());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::var("RAKSHAK_CONFIG_PATH")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| std::path::PathBuf::from("config.json"));
    let config = SentinelConfig::load(&config_path);

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(config = %config_path.display(), capacity = config.feed.capacity, "Rakshak Sentinel starting");

    let devices = tokio::task::spawn_blocking(discover_devices).await?;
    for d in &devices {
        info!(address = %d.address, hardware_id = %d.hardware_id, status = %d.status, device_type = %d.device_type, "device");
    }

    // The blocking webhook client may be neither built nor dropped on an async worker.
    let monitor = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || TrafficMonitor::from_config(&config).map(Arc::new)).await??
    };
    let result = run(&monitor, &config).await;
    tokio::task::spawn_blocking(move || drop(monitor)).await?;

    let ticks = result?;
    info!(ticks, "Rakshak Sentinel stopping");
    Ok(())
}

/// Producer loop until Ctrl+C; returns the number of ticks run.
async fn run(
    monitor: &Arc<TrafficMonitor>,
    config: &SentinelConfig,
) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
    let simulation = &config.simulation;
    let mut interval = tokio::time::interval(Duration::from_millis(config.feed.tick_ms.max(MIN_TICK_MS)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(tick_ms = config.feed.tick_ms, "monitoring (Ctrl+C to stop)");
    let mut tick: u64 = 0;
    let mut injected_at: Option<u64> = None;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = interval.tick() => {}
        }
        tick += 1;

        if simulation.attack_at_tick == Some(tick) {
            let m = Arc::clone(monitor);
            tokio::task::spawn_blocking(move || m.inject_attack()).await?;
            injected_at = Some(tick);
        }
        if let Some(at) = injected_at {
            if simulation.kill_switch_due(at, tick) {
                if let Some(report) = monitor.attack_report() {
                    info!(%report, "forensic report");
                }
                let m = Arc::clone(monitor);
                if let Some(outcome) = tokio::task::spawn_blocking(move || m.engage_kill_switch()).await? {
                    info!(addr = %outcome.target, status = ?outcome.status, message = %outcome.message, "mitigation");
                }
                injected_at = None;
            }
        }

        let m = Arc::clone(monitor);
        match tokio::task::spawn_blocking(move || m.tick()).await {
            Ok(observation) => render(monitor, &observation),
            Err(e) => warn!(tick, error = %e, "tick failed"),
        }
    }
    Ok(tick)
}
