//! HTTP push channel.
//!
//! Delivers push notifications to recipient endpoints as HMAC-SHA256
//! signed JSON posts. Delivery is fire-and-forget relative to alert
//! state: a failure is logged by the dispatcher and never rolls back or
//! retries the underlying transition.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;
use tracing::debug;

use domain::services::{PushError, PushNotification, PushRecipient, PushSender};

type HmacSha256 = Hmac<Sha256>;

/// Push sender delivering over HTTP with per-request timeouts.
pub struct HttpPushSender {
    client: Client,
}

impl HttpPushSender {
    /// Create a sender with the given per-delivery timeout. The timeout
    /// bounds every recipient call so one slow endpoint cannot stall a
    /// whole sweep.
    pub fn new(timeout_ms: u64) -> Result<Self, PushError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PushError::Serialization(e.to_string()))?;
        Ok(Self { client })
    }

    /// Sign the payload with HMAC-SHA256 using the recipient's secret.
    fn sign_payload(payload: &str, secret: &str) -> Result<String, PushError> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| PushError::Serialization(e.to_string()))?;
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("sha256={}", signature))
    }
}

#[async_trait::async_trait]
impl PushSender for HttpPushSender {
    async fn send(
        &self,
        recipient: &PushRecipient,
        notification: &PushNotification,
    ) -> Result<(), PushError> {
        let payload = serde_json::to_string(notification)
            .map_err(|e| PushError::Serialization(e.to_string()))?;
        let signature = Self::sign_payload(&payload, &recipient.secret)?;

        let response = self
            .client
            .post(&recipient.endpoint)
            .header("Content-Type", "application/json")
            .header("X-CollarTrack-Signature", signature)
            .body(payload)
            .send()
            .await
            .map_err(|e| PushError::Delivery {
                recipient: recipient.id.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(
                recipient = %recipient.id,
                status = status.as_u16(),
                "Push endpoint accepted notification"
            );
            Ok(())
        } else if status.is_client_error() {
            Err(PushError::Rejected(recipient.id.clone()))
        } else {
            Err(PushError::Delivery {
                recipient: recipient.id.clone(),
                reason: format!("endpoint returned {}", status),
            })
        }
    }
}
