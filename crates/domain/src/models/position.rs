//! Position report domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A single recorded collar position.
///
/// Reports are append-only: once persisted they are never mutated or
/// deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub report_id: Uuid,
    pub animal_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_level: Option<i32>,
    pub recorded_at: DateTime<Utc>,
}

/// Request payload for recording a position, as handed over by the
/// external ingestion adapter.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPositionRequest {
    pub animal_id: Uuid,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,
}

impl RecordPositionRequest {
    /// Materializes the report with a fresh id and server-side timestamp.
    pub fn into_report(self, now: DateTime<Utc>) -> PositionReport {
        PositionReport {
            report_id: Uuid::new_v4(),
            animal_id: self.animal_id,
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy,
            battery_level: self.battery_level,
            recorded_at: now,
        }
    }
}
