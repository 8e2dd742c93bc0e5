//! Geofence domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a polygonal safe zone.
///
/// The boundary is stored as the raw JSON payload received from the
/// editing surface: an ordered array of `[lat, lng]` pairs. Parsing is
/// deferred to evaluation time so a malformed boundary degrades that one
/// fence instead of the whole store (see [`crate::containment`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub geofence_id: Uuid,
    pub name: String,
    /// Ordered vertex list as a JSON array of `[lat, lng]` pairs.
    pub boundary: serde_json::Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Geofence {
    /// Creates an active geofence from a boundary payload.
    pub fn new(name: impl Into<String>, boundary: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            geofence_id: Uuid::new_v4(),
            name: name.into(),
            boundary,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geofence_defaults_to_active() {
        let fence = Geofence::new("North paddock", serde_json::json!([[0, 0], [0, 1], [1, 1]]));
        assert!(fence.active);
        assert_eq!(fence.name, "North paddock");
    }

    #[test]
    fn test_geofence_serialization() {
        let fence = Geofence::new("Home", serde_json::json!([[0, 0], [0, 10], [10, 10]]));
        let json = serde_json::to_string(&fence).unwrap();
        assert!(json.contains("\"name\":\"Home\""));
        assert!(json.contains("\"boundary\":[[0,0],[0,10],[10,10]]"));
        assert!(json.contains("\"geofenceId\""));
    }
}
