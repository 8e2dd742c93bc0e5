//! Shared utilities for the CollarTrack backend.
//!
//! This crate provides common functionality used across the other crates:
//! - Common validation logic for position payloads

pub mod validation;
