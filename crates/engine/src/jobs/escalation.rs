//! Escalation sweep.
//!
//! Promotes geofence alerts that stayed unresolved past the escalation
//! threshold to urgent severity. Collar-offline alerts are never touched
//! here: they are created already urgent by the connectivity sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::{error, info};

use domain::events::AlertEvent;
use domain::models::alert::escalated_text;
use domain::models::AlertKind;
use domain::services::PushNotification;
use persistence::repositories::AlertRepository;

use crate::services::dispatch::NotificationDispatcher;

/// Periodic sweep escalating aged geofence alerts.
pub struct EscalationSweep {
    alerts: Arc<dyn AlertRepository>,
    dispatcher: Arc<NotificationDispatcher>,
    threshold_secs: u64,
    sweep_secs: u64,
}

impl EscalationSweep {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        dispatcher: Arc<NotificationDispatcher>,
        threshold_secs: u64,
        sweep_secs: u64,
    ) -> Self {
        Self {
            alerts,
            dispatcher,
            threshold_secs,
            sweep_secs,
        }
    }

    /// One escalation pass. Each due alert is handled on its own; a
    /// failed unit of work is logged and the pass moves on.
    pub async fn escalate_due(&self) -> Result<usize, String> {
        let now = Utc::now();
        let cutoff = now - chrono::Duration::seconds(self.threshold_secs as i64);

        let due = self
            .alerts
            .find_escalation_due(AlertKind::Geofence, cutoff)
            .await
            .map_err(|e| format!("Failed to query due alerts: {}", e))?;

        let mut escalated = 0;
        for alert in due {
            let (title, description) = escalated_text(&alert);

            // The escalated flag is re-checked inside the conditional
            // update; a concurrent sweep or dismissal turns this into a
            // no-op instead of a double escalation.
            match self
                .alerts
                .escalate(alert.alert_id, title, description, now)
                .await
            {
                Ok(Some(updated)) => {
                    counter!("alerts_escalated_total").increment(1);
                    info!(
                        alert_id = %updated.alert_id,
                        animal_id = %updated.animal_id,
                        age_secs = updated.age(now).num_seconds(),
                        "Alert escalated to urgent"
                    );
                    let push_pending = !updated.push_sent;
                    let notification = PushNotification::for_alert(&updated);
                    self.dispatcher.publish(AlertEvent::Escalated(updated.clone()));

                    if push_pending {
                        self.dispatcher.send_push(&notification).await;
                        if let Err(e) = self.alerts.mark_push_sent(updated.alert_id).await {
                            error!(
                                alert_id = %updated.alert_id,
                                error = %e,
                                "Failed to record push delivery flag"
                            );
                        }
                    }

                    escalated += 1;
                }
                Ok(None) => {
                    // Raced with another actor; nothing to do.
                }
                Err(e) => {
                    error!(
                        alert_id = %alert.alert_id,
                        error = %e,
                        "Failed to escalate alert; continuing sweep"
                    );
                }
            }
        }

        Ok(escalated)
    }
}

#[async_trait::async_trait]
impl crate::jobs::scheduler::Sweep for EscalationSweep {
    fn name(&self) -> &'static str {
        "escalation"
    }

    fn interval(&self) -> Duration {
        Duration::from_secs(self.sweep_secs)
    }

    async fn run(&self) -> Result<(), String> {
        let escalated = self.escalate_due().await?;
        if escalated > 0 {
            info!(escalated = escalated, "Escalation sweep promoted alerts");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::{AlertDraft, AlertSeverity};
    use domain::services::MockPushSender;
    use domain::services::PushRecipient;
    use persistence::memory::MemoryAlertRepository;
    use uuid::Uuid;

    fn recipient(id: &str) -> PushRecipient {
        PushRecipient {
            id: id.to_string(),
            endpoint: format!("https://push.example.com/{}", id),
            secret: "s3cret".to_string(),
        }
    }

    fn build(
        threshold_secs: u64,
    ) -> (EscalationSweep, Arc<MemoryAlertRepository>, Arc<MockPushSender>) {
        let alerts = Arc::new(MemoryAlertRepository::new());
        let sender = Arc::new(MockPushSender::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            64,
            vec![recipient("barn-office")],
            Arc::clone(&sender) as Arc<dyn domain::services::PushSender>,
        ));
        let sweep = EscalationSweep::new(
            Arc::clone(&alerts) as Arc<dyn AlertRepository>,
            dispatcher,
            threshold_secs,
            15,
        );
        (sweep, alerts, sender)
    }

    #[tokio::test]
    async fn test_young_alert_is_not_escalated() {
        let (sweep, alerts, sender) = build(3600);
        alerts
            .insert_if_none_active(AlertDraft::geofence_breach(Uuid::new_v4(), "Bella"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sweep.escalate_due().await.unwrap(), 0);
        assert!(sender.deliveries().is_empty());
    }

    #[tokio::test]
    async fn test_aged_alert_escalates_exactly_once() {
        let (sweep, alerts, sender) = build(0);
        let alert = alerts
            .insert_if_none_active(AlertDraft::geofence_breach(Uuid::new_v4(), "Bella"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sweep.escalate_due().await.unwrap(), 1);

        let stored = alerts.find_by_id(alert.alert_id).await.unwrap().unwrap();
        assert!(stored.escalated);
        assert_eq!(stored.severity, AlertSeverity::Urgent);
        assert!(stored.title.starts_with("URGENT:"));
        assert!(stored.push_sent);
        let first_stamp = stored.escalated_at;
        assert!(first_stamp.is_some());

        // An immediate second sweep is a no-op and the stamp survives.
        assert_eq!(sweep.escalate_due().await.unwrap(), 0);
        let stored = alerts.find_by_id(alert.alert_id).await.unwrap().unwrap();
        assert_eq!(stored.escalated_at, first_stamp);
        assert_eq!(sender.deliveries().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_alerts_are_never_touched() {
        let (sweep, alerts, _) = build(0);
        let alert = alerts
            .insert_if_none_active(AlertDraft::collar_offline(
                Uuid::new_v4(),
                "Bella",
                12,
                Utc::now(),
            ))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(sweep.escalate_due().await.unwrap(), 0);
        let stored = alerts.find_by_id(alert.alert_id).await.unwrap().unwrap();
        assert_eq!(stored.escalated_at, alert.escalated_at);
    }

    #[tokio::test]
    async fn test_dismissed_alert_is_not_escalated() {
        let (sweep, alerts, _) = build(0);
        let alert = alerts
            .insert_if_none_active(AlertDraft::geofence_breach(Uuid::new_v4(), "Bella"))
            .await
            .unwrap()
            .unwrap();
        alerts.deactivate(alert.alert_id).await.unwrap();

        assert_eq!(sweep.escalate_due().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_escalated_event_is_broadcast() {
        let alerts = Arc::new(MemoryAlertRepository::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(
            64,
            Vec::new(),
            Arc::new(MockPushSender::new()),
        ));
        let sweep = EscalationSweep::new(
            Arc::clone(&alerts) as Arc<dyn AlertRepository>,
            Arc::clone(&dispatcher),
            0,
            15,
        );
        let mut events = dispatcher.subscribe();

        alerts
            .insert_if_none_active(AlertDraft::geofence_breach(Uuid::new_v4(), "Bella"))
            .await
            .unwrap()
            .unwrap();
        sweep.escalate_due().await.unwrap();

        let event = events.events.recv().await.unwrap();
        assert_eq!(event.kind(), "escalated");
        assert!(event.alert().escalated);
    }
}
