//! Alert lifecycle management.
//!
//! One state machine per `(animal, kind)`:
//! `NONE -> ACTIVE(warning) -> ACTIVE(escalated) -> DISMISSED`, where a
//! dismissed alert can re-enter ACTIVE on a fresh violation. Transitions
//! persist first and only then emit an event; a persistence failure
//! aborts the whole call with nothing emitted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use metrics::counter;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use domain::events::AlertEvent;
use domain::models::{Alert, AlertDraft, AlertKind, Animal};
use persistence::repositories::AlertRepository;

use crate::error::EngineError;
use crate::services::dispatch::NotificationDispatcher;

/// Drives alert creation, dedup and dismissal.
pub struct AlertLifecycleManager {
    alerts: Arc<dyn AlertRepository>,
    dispatcher: Arc<NotificationDispatcher>,
    /// Keyed locks serializing read-modify-write per `(animal, kind)`.
    /// The repository's conditional updates keep the store consistent on
    /// their own; the locks additionally guarantee that near-simultaneous
    /// reports for one animal settle in one serialization order.
    locks: Mutex<HashMap<(Uuid, AlertKind), Arc<AsyncMutex<()>>>>,
}

impl AlertLifecycleManager {
    pub fn new(alerts: Arc<dyn AlertRepository>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            alerts,
            dispatcher,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn guard(&self, animal_id: Uuid, kind: AlertKind) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("alert lock table poisoned");
            Arc::clone(
                locks
                    .entry((animal_id, kind))
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        lock.lock_owned().await
    }

    /// Applies a containment verdict for an animal's latest position.
    ///
    /// Outside with no active geofence alert opens one at warning
    /// severity; inside with an active alert dismisses it. Every other
    /// combination is a no-op, so repeated identical reports change
    /// nothing.
    pub async fn on_position_evaluated(
        &self,
        animal: &Animal,
        contained: bool,
    ) -> Result<(), EngineError> {
        let _guard = self.guard(animal.animal_id, AlertKind::Geofence).await;

        if contained {
            if let Some(active) = self
                .alerts
                .find_active(animal.animal_id, AlertKind::Geofence)
                .await?
            {
                self.dismiss_unguarded(active.alert_id).await?;
            }
        } else {
            self.raise_unguarded(AlertDraft::geofence_breach(animal.animal_id, &animal.name))
                .await?;
        }

        Ok(())
    }

    /// Applies a battery reading for an animal's collar.
    ///
    /// At or below the floor opens a low-battery warning; above it clears
    /// an existing one. Low-battery alerts never escalate.
    pub async fn on_battery_evaluated(
        &self,
        animal: &Animal,
        level: i32,
        floor: i32,
    ) -> Result<(), EngineError> {
        let _guard = self.guard(animal.animal_id, AlertKind::LowBattery).await;

        if level <= floor {
            self.raise_unguarded(AlertDraft::low_battery(
                animal.animal_id,
                &animal.name,
                level,
            ))
            .await?;
        } else if let Some(active) = self
            .alerts
            .find_active(animal.animal_id, AlertKind::LowBattery)
            .await?
        {
            self.dismiss_unguarded(active.alert_id).await?;
        }

        Ok(())
    }

    /// Opens a new alert unless an active one already exists for the
    /// draft's `(animal, kind)`. Persists first, then emits `created`.
    /// Returns `None` when deduplicated.
    pub async fn raise(&self, draft: AlertDraft) -> Result<Option<Alert>, EngineError> {
        let _guard = self.guard(draft.animal_id, draft.kind).await;
        self.raise_unguarded(draft).await
    }

    /// Dismisses an alert by id. Persists first, then emits `dismissed`.
    /// Returns `false` as a no-op when the alert is missing or already
    /// inactive; no event is emitted in that case.
    pub async fn dismiss(&self, alert_id: Uuid) -> Result<bool, EngineError> {
        self.dismiss_unguarded(alert_id).await
    }

    async fn raise_unguarded(&self, draft: AlertDraft) -> Result<Option<Alert>, EngineError> {
        let kind = draft.kind;
        let animal_id = draft.animal_id;

        match self.alerts.insert_if_none_active(draft).await? {
            Some(alert) => {
                counter!("alerts_created_total", "kind" => kind.as_str()).increment(1);
                info!(
                    alert_id = %alert.alert_id,
                    animal_id = %alert.animal_id,
                    kind = kind.as_str(),
                    severity = %alert.severity,
                    "Alert created"
                );
                self.dispatcher.publish(AlertEvent::Created(alert.clone()));
                Ok(Some(alert))
            }
            None => {
                debug!(
                    animal_id = %animal_id,
                    kind = kind.as_str(),
                    "Active alert already exists, create deduplicated"
                );
                Ok(None)
            }
        }
    }

    async fn dismiss_unguarded(&self, alert_id: Uuid) -> Result<bool, EngineError> {
        match self.alerts.deactivate(alert_id).await? {
            Some(alert) => {
                counter!("alerts_dismissed_total", "kind" => alert.kind.as_str()).increment(1);
                info!(
                    alert_id = %alert.alert_id,
                    animal_id = %alert.animal_id,
                    kind = alert.kind.as_str(),
                    "Alert dismissed"
                );
                self.dispatcher.publish(AlertEvent::Dismissed(alert));
                Ok(true)
            }
            None => {
                debug!(alert_id = %alert_id, "Dismiss was a no-op");
                Ok(false)
            }
        }
    }
}
