//! Typed alert lifecycle events.
//!
//! State mutation and transport are decoupled: the lifecycle manager and
//! the sweeps emit these events, the dispatcher fans them out.

use serde::{Deserialize, Serialize};

use crate::models::Alert;

/// A lifecycle transition on an alert, published after the transition has
/// been persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "alert", rename_all = "snake_case")]
pub enum AlertEvent {
    Created(Alert),
    Dismissed(Alert),
    Escalated(Alert),
}

impl AlertEvent {
    /// The transition name, for logging and wire tagging.
    pub fn kind(&self) -> &'static str {
        match self {
            AlertEvent::Created(_) => "created",
            AlertEvent::Dismissed(_) => "dismissed",
            AlertEvent::Escalated(_) => "escalated",
        }
    }

    /// The alert the event is about.
    pub fn alert(&self) -> &Alert {
        match self {
            AlertEvent::Created(a) | AlertEvent::Dismissed(a) | AlertEvent::Escalated(a) => a,
        }
    }
}
