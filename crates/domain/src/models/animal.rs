//! Animal domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a tracked animal in the system.
///
/// Animals are created and edited through external CRUD surfaces; the
/// monitoring engine only reads them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animal {
    pub animal_id: Uuid,
    pub name: String,
    /// Collar currently assigned to this animal, if any.
    pub collar_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Animal {
    /// Creates a new animal with a freshly assigned id.
    pub fn new(name: impl Into<String>, collar_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            animal_id: Uuid::new_v4(),
            name: name.into(),
            collar_id,
            created_at: now,
            updated_at: now,
        }
    }
}
