//! Domain models for CollarTrack.

pub mod alert;
pub mod animal;
pub mod collar;
pub mod geofence;
pub mod position;

pub use alert::{Alert, AlertDraft, AlertKind, AlertSeverity};
pub use animal::Animal;
pub use collar::Collar;
pub use geofence::Geofence;
pub use position::PositionReport;
