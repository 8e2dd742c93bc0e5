//! Repository contracts.
//!
//! Each aggregate gets its own trait so the engine can be wired against
//! any storage technology; alert queries support filtering by
//! `(animal_id, kind, active)` as the lifecycle manager requires.

pub mod alert;
pub mod animal;
pub mod collar;
pub mod geofence;
pub mod position;

pub use alert::AlertRepository;
pub use animal::AnimalRepository;
pub use collar::CollarRepository;
pub use geofence::GeofenceRepository;
pub use position::PositionRepository;
