//! Push notification abstraction.
//!
//! The engine fans push notifications out to configured recipients; the
//! concrete transport lives behind [`PushSender`] so the engine can be
//! tested fully offline.

use serde::{Deserialize, Serialize};

/// A push notification payload as delivered to a recipient channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushNotification {
    pub title: String,
    pub body: String,
    /// Collapse key: notifications with the same tag replace each other
    /// on the receiving device.
    pub tag: String,
    /// Whether the notification should stay on screen until acted on.
    pub require_interaction: bool,
}

impl PushNotification {
    /// Builds the payload for an alert, tagged so repeated notifications
    /// for the same alert collapse client-side.
    pub fn for_alert(alert: &crate::models::Alert) -> Self {
        Self {
            title: alert.title.clone(),
            body: alert.description.clone(),
            tag: format!("alert-{}", alert.alert_id),
            require_interaction: matches!(
                alert.severity,
                crate::models::AlertSeverity::Urgent
            ),
        }
    }
}

/// A configured push recipient. Identity is opaque to the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct PushRecipient {
    pub id: String,
    pub endpoint: String,
    pub secret: String,
}

/// Error type for push delivery.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },

    #[error("recipient {0} rejected the payload")]
    Rejected(String),

    #[error("payload serialization failed: {0}")]
    Serialization(String),
}

/// Push delivery trait.
///
/// A send failure is an isolated delivery outcome, never a reason to roll
/// back alert state.
#[async_trait::async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        recipient: &PushRecipient,
        notification: &PushNotification,
    ) -> Result<(), PushError>;
}

/// Mock push sender for development and testing.
///
/// Records every send and can simulate failures for selected recipients.
#[derive(Debug, Default)]
pub struct MockPushSender {
    sent: std::sync::Mutex<Vec<(String, PushNotification)>>,
    failing_recipients: Vec<String>,
}

impl MockPushSender {
    /// Create a mock sender that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock sender that fails deliveries to the given recipient ids.
    pub fn failing_for(recipients: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            failing_recipients: recipients.into_iter().map(Into::into).collect(),
        }
    }

    /// Recipient ids that received a notification, in send order.
    pub fn deliveries(&self) -> Vec<(String, PushNotification)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PushSender for MockPushSender {
    async fn send(
        &self,
        recipient: &PushRecipient,
        notification: &PushNotification,
    ) -> Result<(), PushError> {
        if self.failing_recipients.contains(&recipient.id) {
            tracing::warn!(
                recipient = %recipient.id,
                tag = %notification.tag,
                "Mock push sender simulating failure"
            );
            return Err(PushError::Delivery {
                recipient: recipient.id.clone(),
                reason: "simulated failure".to_string(),
            });
        }

        tracing::info!(
            recipient = %recipient.id,
            tag = %notification.tag,
            title = %notification.title,
            "Mock: would send push notification"
        );
        self.sent
            .lock()
            .unwrap()
            .push((recipient.id.clone(), notification.clone()));
        Ok(())
    }
}
