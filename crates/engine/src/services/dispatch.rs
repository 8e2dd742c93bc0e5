//! Notification fan-out.
//!
//! One dispatcher instance consumes lifecycle events from the rest of the
//! engine and multicasts them to real-time subscribers and, on demand, to
//! the configured push recipients. The dispatcher keeps no delivery
//! memory of its own; the `push_sent` flag on the alert row is the single
//! source of truth and its upkeep belongs to the callers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use domain::events::AlertEvent;
use domain::services::{PushNotification, PushRecipient, PushSender};

/// Handle returned to a new real-time subscriber.
///
/// Joining late yields no backlog: `connected_at` is the only thing a
/// fresh subscriber receives about the past.
pub struct Subscription {
    pub connected_at: DateTime<Utc>,
    pub events: broadcast::Receiver<AlertEvent>,
}

/// Fans lifecycle events out to real-time subscribers and pushes to the
/// configured recipients.
pub struct NotificationDispatcher {
    events_tx: broadcast::Sender<AlertEvent>,
    recipients: Vec<PushRecipient>,
    push: Arc<dyn PushSender>,
}

impl NotificationDispatcher {
    pub fn new(
        channel_capacity: usize,
        recipients: Vec<PushRecipient>,
        push: Arc<dyn PushSender>,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(channel_capacity);
        Self {
            events_tx,
            recipients,
            push,
        }
    }

    /// Registers a real-time subscriber. At-most-once per subscriber from
    /// here on; nothing that happened earlier is replayed.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            connected_at: Utc::now(),
            events: self.events_tx.subscribe(),
        }
    }

    /// Number of currently connected real-time subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.events_tx.receiver_count()
    }

    /// Broadcasts a lifecycle event to all connected subscribers.
    ///
    /// Fire-and-forget: an empty subscriber list is not an error.
    pub fn publish(&self, event: AlertEvent) {
        counter!("alert_events_total", "type" => event.kind()).increment(1);
        debug!(
            event = event.kind(),
            alert_id = %event.alert().alert_id,
            animal_id = %event.alert().animal_id,
            "Broadcasting lifecycle event"
        );
        // Err here only means no subscriber is connected right now.
        let _ = self.events_tx.send(event);
    }

    /// Sends a push notification to every configured recipient.
    ///
    /// Deliveries are independent: one failing recipient is logged and
    /// never blocks or fails the rest. Returns the number of successful
    /// deliveries.
    pub async fn send_push(&self, notification: &PushNotification) -> usize {
        let mut delivered = 0;

        for recipient in &self.recipients {
            match self.push.send(recipient, notification).await {
                Ok(()) => {
                    counter!("push_deliveries_total", "outcome" => "ok").increment(1);
                    info!(
                        recipient = %recipient.id,
                        tag = %notification.tag,
                        "Push notification delivered"
                    );
                    delivered += 1;
                }
                Err(e) => {
                    counter!("push_deliveries_total", "outcome" => "failed").increment(1);
                    warn!(
                        recipient = %recipient.id,
                        tag = %notification.tag,
                        error = %e,
                        "Push delivery failed; continuing with remaining recipients"
                    );
                }
            }
        }

        delivered
    }
}
