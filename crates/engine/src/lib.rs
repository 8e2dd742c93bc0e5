//! CollarTrack monitoring engine.
//!
//! Wires position ingestion, the alert lifecycle, background sweeps and
//! notification fan-out together. The binary in `main.rs` is a thin
//! shell over this library; integration tests drive the same modules
//! directly.

pub mod app;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod services;
