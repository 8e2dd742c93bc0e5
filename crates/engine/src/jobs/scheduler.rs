//! Sweep scheduling infrastructure.
//!
//! Sweeps are explicit, stoppable timer-driven tasks started by the
//! process entry point. Tests call `run()` directly instead of waiting
//! on wall-clock timers; overlapping executions stay safe because every
//! mutating check inside a sweep is conditional and flag-guarded.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Trait for implementing periodic sweeps.
#[async_trait::async_trait]
pub trait Sweep: Send + Sync {
    /// The name of this sweep (used for logging).
    fn name(&self) -> &'static str;

    /// Interval between executions; configured externally and expected
    /// to sit well below the thresholds the sweep polices.
    fn interval(&self) -> Duration;

    /// Execute one pass. Returns Ok(()) on success, Err with message on
    /// failure; either way the next pass fires on schedule.
    async fn run(&self) -> Result<(), String>;
}

/// Runs registered sweeps on their intervals until shutdown.
pub struct SweepRunner {
    sweeps: Vec<Arc<dyn Sweep>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SweepRunner {
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            sweeps: Vec::new(),
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        }
    }

    /// Register a sweep with the runner.
    pub fn register<S: Sweep + 'static>(&mut self, sweep: S) {
        self.sweeps.push(Arc::new(sweep));
    }

    /// Start all registered sweeps.
    pub fn start(&mut self) {
        info!("Starting sweep runner with {} sweeps", self.sweeps.len());

        for sweep in &self.sweeps {
            let sweep = Arc::clone(sweep);
            let mut shutdown_rx = self.shutdown_rx.clone();

            let handle = tokio::spawn(async move {
                let name = sweep.name();
                let mut interval = tokio::time::interval(sweep.interval());

                // Skip the first immediate tick.
                interval.tick().await;

                info!(sweep = name, interval = ?sweep.interval(), "Sweep scheduled");

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let start = std::time::Instant::now();

                            match sweep.run().await {
                                Ok(()) => {
                                    info!(
                                        sweep = name,
                                        elapsed_ms = start.elapsed().as_millis(),
                                        "Sweep completed"
                                    );
                                }
                                Err(e) => {
                                    error!(
                                        sweep = name,
                                        elapsed_ms = start.elapsed().as_millis(),
                                        error = %e,
                                        "Sweep failed"
                                    );
                                }
                            }
                        }
                        _ = shutdown_rx.changed() => {
                            if *shutdown_rx.borrow() {
                                info!(sweep = name, "Sweep shutting down");
                                break;
                            }
                        }
                    }
                }
            });

            self.handles.push(handle);
        }
    }

    /// Initiate graceful shutdown of all sweeps.
    /// Returns immediately after signaling shutdown.
    pub fn shutdown(&self) {
        info!("Initiating sweep runner shutdown");
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all sweeps to complete with timeout.
    pub async fn wait_for_shutdown(self, timeout: Duration) {
        info!("Waiting for sweeps to complete (timeout: {:?})", timeout);

        let shutdown_future = async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    warn!("Sweep task panicked: {}", e);
                }
            }
        };

        match tokio::time::timeout(timeout, shutdown_future).await {
            Ok(()) => info!("All sweeps completed gracefully"),
            Err(_) => warn!("Sweep shutdown timed out after {:?}", timeout),
        }
    }
}

impl Default for SweepRunner {
    fn default() -> Self {
        Self::new()
    }
}
