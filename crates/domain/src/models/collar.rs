//! Collar domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a GPS collar registered in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collar {
    pub collar_id: Uuid,
    /// Hardware serial printed on the collar.
    pub serial: String,
    /// Animal this collar is strapped to, if assigned.
    pub animal_id: Option<Uuid>,
    pub battery_level: Option<i32>,
    pub online: bool,
    pub last_signal_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collar {
    /// Creates a collar record for a known animal.
    pub fn new(serial: impl Into<String>, animal_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            collar_id: Uuid::new_v4(),
            serial: serial.into(),
            animal_id,
            battery_level: None,
            online: false,
            last_signal_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Auto-provisions a collar for an animal that reported without a
    /// registered collar. The serial is synthesized from the animal id so
    /// operators can spot unprovisioned hardware in listings.
    pub fn provisioned_for(animal_id: Uuid) -> Self {
        let serial = format!("AUTO-{}", &animal_id.simple().to_string()[..12]);
        Self::new(serial, Some(animal_id))
    }

    /// A collar takes part in connectivity monitoring only once it is
    /// assigned to an animal and has signalled at least once.
    pub fn is_monitorable(&self) -> bool {
        self.animal_id.is_some() && self.last_signal_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioned_collar_has_auto_serial() {
        let animal_id = Uuid::new_v4();
        let collar = Collar::provisioned_for(animal_id);
        assert!(collar.serial.starts_with("AUTO-"));
        assert_eq!(collar.animal_id, Some(animal_id));
    }

    #[test]
    fn test_is_monitorable_requires_assignment_and_signal() {
        let mut collar = Collar::new("C-1000", None);
        assert!(!collar.is_monitorable());

        collar.animal_id = Some(Uuid::new_v4());
        assert!(!collar.is_monitorable());

        collar.last_signal_at = Some(Utc::now());
        assert!(collar.is_monitorable());
    }

    #[test]
    fn test_collar_serialization() {
        let collar = Collar::new("C-1000", None);
        let json = serde_json::to_string(&collar).unwrap();
        assert!(json.contains("\"serial\":\"C-1000\""));
        assert!(json.contains("\"online\":false"));
        assert!(json.contains("\"lastSignalAt\":null"));
    }
}
