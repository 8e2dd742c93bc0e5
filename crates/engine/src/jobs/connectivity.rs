//! Connectivity watchdog sweep.
//!
//! Detects collars that stopped signalling and clears offline alerts for
//! collars that resumed. Between the recovery and offline thresholds sits
//! a dead zone where neither happens, damping alert flapping near the
//! boundary.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{error, info, warn};

use domain::models::{AlertDraft, AlertKind, Collar};
use domain::services::PushNotification;
use persistence::repositories::{AlertRepository, AnimalRepository, CollarRepository};

use crate::services::alerts::AlertLifecycleManager;
use crate::services::dispatch::NotificationDispatcher;

/// Periodic sweep over collar signal freshness.
pub struct ConnectivitySweep {
    animals: Arc<dyn AnimalRepository>,
    collars: Arc<dyn CollarRepository>,
    alerts: Arc<dyn AlertRepository>,
    manager: Arc<AlertLifecycleManager>,
    dispatcher: Arc<NotificationDispatcher>,
    offline_threshold_minutes: u64,
    recovery_threshold_minutes: u64,
    low_battery_floor_percent: i32,
    sweep_secs: u64,
}

impl ConnectivitySweep {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        animals: Arc<dyn AnimalRepository>,
        collars: Arc<dyn CollarRepository>,
        alerts: Arc<dyn AlertRepository>,
        manager: Arc<AlertLifecycleManager>,
        dispatcher: Arc<NotificationDispatcher>,
        offline_threshold_minutes: u64,
        recovery_threshold_minutes: u64,
        low_battery_floor_percent: i32,
        sweep_secs: u64,
    ) -> Self {
        Self {
            animals,
            collars,
            alerts,
            manager,
            dispatcher,
            offline_threshold_minutes,
            recovery_threshold_minutes,
            low_battery_floor_percent,
            sweep_secs,
        }
    }

    /// One watchdog pass over all monitorable collars. Per-collar
    /// failures are logged and the pass continues.
    pub async fn check_collars(&self) -> Result<usize, String> {
        let collars = self
            .collars
            .find_monitorable()
            .await
            .map_err(|e| format!("Failed to list monitorable collars: {}", e))?;

        let mut transitions = 0;
        for collar in collars {
            match self.check_collar(&collar).await {
                Ok(changed) => {
                    if changed {
                        transitions += 1;
                    }
                }
                Err(e) => {
                    error!(
                        collar_id = %collar.collar_id,
                        error = %e,
                        "Watchdog check failed for collar; continuing sweep"
                    );
                }
            }
        }

        Ok(transitions)
    }

    async fn check_collar(&self, collar: &Collar) -> Result<bool, String> {
        // find_monitorable guarantees both fields; bail defensively if a
        // foreign implementation returns looser rows.
        let (animal_id, last_signal) = match (collar.animal_id, collar.last_signal_at) {
            (Some(animal_id), Some(last_signal)) => (animal_id, last_signal),
            _ => return Ok(false),
        };

        let now = Utc::now();
        let silent_minutes = (now - last_signal).num_minutes();

        if silent_minutes > self.offline_threshold_minutes as i64 {
            // A collar that went dark with an empty battery is a battery
            // problem, not a connectivity fault.
            let battery_ok = collar
                .battery_level
                .map_or(true, |level| level > self.low_battery_floor_percent);
            if !battery_ok {
                return Ok(false);
            }

            let animal = match self
                .animals
                .find_by_id(animal_id)
                .await
                .map_err(|e| e.to_string())?
            {
                Some(animal) => animal,
                None => {
                    warn!(
                        collar_id = %collar.collar_id,
                        animal_id = %animal_id,
                        "Collar references a missing animal; skipping"
                    );
                    return Ok(false);
                }
            };

            let draft =
                AlertDraft::collar_offline(animal_id, &animal.name, silent_minutes, now);
            let created = self
                .manager
                .raise(draft)
                .await
                .map_err(|e| e.to_string())?;

            if let Some(alert) = created {
                counter!("collars_marked_offline_total").increment(1);
                info!(
                    collar_id = %collar.collar_id,
                    animal_id = %animal_id,
                    silent_minutes = silent_minutes,
                    "Collar offline alert raised"
                );
                self.collars
                    .set_online(collar.collar_id, false)
                    .await
                    .map_err(|e| e.to_string())?;

                // Offline alerts are born urgent; notify immediately and
                // record it so the escalation path never re-sends.
                self.dispatcher
                    .send_push(&PushNotification::for_alert(&alert))
                    .await;
                self.alerts
                    .mark_push_sent(alert.alert_id)
                    .await
                    .map_err(|e| e.to_string())?;
                return Ok(true);
            }
        } else if silent_minutes <= self.recovery_threshold_minutes as i64 {
            if let Some(active) = self
                .alerts
                .find_active(animal_id, AlertKind::CollarOffline)
                .await
                .map_err(|e| e.to_string())?
            {
                let dismissed = self
                    .manager
                    .dismiss(active.alert_id)
                    .await
                    .map_err(|e| e.to_string())?;
                if dismissed {
                    info!(
                        collar_id = %collar.collar_id,
                        animal_id = %animal_id,
                        "Collar signal recovered, offline alert cleared"
                    );
                    return Ok(true);
                }
            }
        }
        // Inside the dead zone: neither raise nor clear.

        Ok(false)
    }
}

#[async_trait::async_trait]
impl crate::jobs::scheduler::Sweep for ConnectivitySweep {
    fn name(&self) -> &'static str {
        "connectivity"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.sweep_secs)
    }

    async fn run(&self) -> Result<(), String> {
        let transitions = self.check_collars().await?;
        if transitions > 0 {
            info!(transitions = transitions, "Connectivity sweep applied transitions");
        }
        Ok(())
    }
}
