//! Engine assembly.
//!
//! Builds the service graph from configuration and a repository set. The
//! binary uses the in-memory store; a deployment with durable storage
//! swaps the repositories without touching the wiring below.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use domain::services::{MockPushSender, PushError, PushSender};
use persistence::memory::MemoryStore;

use crate::config::Config;
use crate::jobs::{ConnectivitySweep, EscalationSweep, SweepRunner};
use crate::services::{
    AlertLifecycleManager, HttpPushSender, NotificationDispatcher, PositionIngestor,
};

/// The assembled engine.
pub struct App {
    /// Entry point for the external ingestion adapter (HTTP/MQTT).
    pub ingestor: Arc<PositionIngestor>,
    /// Real-time subscription and push fan-out surface.
    pub dispatcher: Arc<NotificationDispatcher>,
    /// Alert primitives, exposed for operational tooling.
    pub manager: Arc<AlertLifecycleManager>,
    runner: SweepRunner,
}

/// Wires services and sweeps against the given store.
pub fn build(config: &Config, store: &MemoryStore) -> Result<App, PushError> {
    let push: Arc<dyn PushSender> = if config.push.enabled {
        Arc::new(HttpPushSender::new(config.push.timeout_ms)?)
    } else {
        info!("Push channel disabled; deliveries will be logged only");
        Arc::new(MockPushSender::new())
    };

    let dispatcher = Arc::new(NotificationDispatcher::new(
        config.realtime.channel_capacity,
        config.push.recipients.clone(),
        push,
    ));

    let manager = Arc::new(AlertLifecycleManager::new(
        store.alerts.clone(),
        Arc::clone(&dispatcher),
    ));

    let ingestor = Arc::new(PositionIngestor::new(
        store.animals.clone(),
        store.collars.clone(),
        store.geofences.clone(),
        store.positions.clone(),
        Arc::clone(&manager),
        config.monitoring.low_battery_floor_percent,
    ));

    let mut runner = SweepRunner::new();
    runner.register(EscalationSweep::new(
        store.alerts.clone(),
        Arc::clone(&dispatcher),
        config.monitoring.escalation_threshold_secs,
        config.monitoring.escalation_sweep_secs,
    ));
    runner.register(ConnectivitySweep::new(
        store.animals.clone(),
        store.collars.clone(),
        store.alerts.clone(),
        Arc::clone(&manager),
        Arc::clone(&dispatcher),
        config.monitoring.offline_threshold_minutes,
        config.monitoring.recovery_threshold_minutes,
        config.monitoring.low_battery_floor_percent,
        config.monitoring.connectivity_sweep_secs,
    ));

    Ok(App {
        ingestor,
        dispatcher,
        manager,
        runner,
    })
}

impl App {
    /// Start the background sweeps.
    pub fn start_sweeps(&mut self) {
        self.runner.start();
    }

    /// Graceful shutdown: signal every sweep and wait up to `timeout`.
    pub async fn shutdown(self, timeout: Duration) {
        self.runner.shutdown();
        self.runner.wait_for_shutdown(timeout).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_defaults() {
        let config = Config::load_for_test(&[]).unwrap();
        let store = MemoryStore::new();
        assert!(build(&config, &store).is_ok());
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let config = Config::load_for_test(&[]).unwrap();
        let store = MemoryStore::new();
        let mut app = build(&config, &store).unwrap();
        app.start_sweeps();
        app.shutdown(Duration::from_secs(2)).await;
    }
}
