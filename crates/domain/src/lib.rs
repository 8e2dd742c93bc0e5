//! Domain layer for the CollarTrack backend.
//!
//! This crate contains:
//! - Domain models (Animal, Collar, Geofence, PositionReport, Alert)
//! - The pure safe-zone containment evaluator
//! - Typed alert lifecycle events
//! - The push delivery abstraction

pub mod containment;
pub mod events;
pub mod models;
pub mod services;
