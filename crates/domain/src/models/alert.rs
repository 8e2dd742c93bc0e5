//! Alert domain model and lifecycle vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Alert categories raised by the monitoring engine.
///
/// Each kind runs its own independent state machine per animal; an animal
/// may hold one active alert of every kind at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Geofence,
    CollarOffline,
    LowBattery,
}

impl AlertKind {
    /// Converts to storage string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Geofence => "geofence",
            AlertKind::CollarOffline => "collar_offline",
            AlertKind::LowBattery => "low_battery",
        }
    }

    /// Parses from storage string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "geofence" => Some(AlertKind::Geofence),
            "collar_offline" => Some(AlertKind::CollarOffline),
            "low_battery" => Some(AlertKind::LowBattery),
            _ => None,
        }
    }
}

/// Alert severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Urgent,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Warning => write!(f, "warning"),
            AlertSeverity::Urgent => write!(f, "urgent"),
        }
    }
}

/// An alert raised for an animal.
///
/// At most one alert per `(animal_id, kind)` may be active at a time.
/// Alerts are soft-deactivated on dismissal and kept as audit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub alert_id: Uuid,
    pub animal_id: Uuid,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    pub active: bool,
    pub escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalated_at: Option<DateTime<Utc>>,
    pub push_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Age of the alert relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.created_at
    }
}

/// Everything needed to open a new alert; ids and timestamps are assigned
/// by the repository on insert.
#[derive(Debug, Clone)]
pub struct AlertDraft {
    pub animal_id: Uuid,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub title: String,
    pub description: String,
    pub escalated: bool,
    pub escalated_at: Option<DateTime<Utc>>,
}

impl AlertDraft {
    /// A warning-level safe-zone breach alert.
    pub fn geofence_breach(animal_id: Uuid, animal_name: &str) -> Self {
        Self {
            animal_id,
            kind: AlertKind::Geofence,
            severity: AlertSeverity::Warning,
            title: format!("{} left the safe zone", animal_name),
            description: format!(
                "{} was last reported outside every active safe zone.",
                animal_name
            ),
            escalated: false,
            escalated_at: None,
        }
    }

    /// A collar-offline alert. These are born urgent: by the time the
    /// watchdog fires, the collar has already been silent past the
    /// offline threshold.
    pub fn collar_offline(
        animal_id: Uuid,
        animal_name: &str,
        silent_minutes: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            animal_id,
            kind: AlertKind::CollarOffline,
            severity: AlertSeverity::Urgent,
            title: format!("{}'s collar is offline", animal_name),
            description: format!(
                "No signal from {}'s collar for {} minutes.",
                animal_name, silent_minutes
            ),
            escalated: true,
            escalated_at: Some(now),
        }
    }

    /// A warning-level low-battery alert.
    pub fn low_battery(animal_id: Uuid, animal_name: &str, level: i32) -> Self {
        Self {
            animal_id,
            kind: AlertKind::LowBattery,
            severity: AlertSeverity::Warning,
            title: format!("{}'s collar battery is low", animal_name),
            description: format!("{}'s collar reported {}% battery.", animal_name, level),
            escalated: false,
            escalated_at: None,
        }
    }
}

/// Urgent replacement text applied when a geofence alert escalates.
pub fn escalated_text(alert: &Alert) -> (String, String) {
    (
        format!("URGENT: {}", alert.title.trim_start_matches("URGENT: ")),
        format!(
            "{} The alert has been open without resolution and was escalated.",
            alert.description
        ),
    )
}
