//! Safe-zone containment evaluation.
//!
//! Pure point-in-polygon tests over raw lat/lng. Containment is planar
//! (no geodesic correction): paddock-scale fences are small enough that
//! treating coordinates as a flat plane matches what the map editor drew.

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::Geofence;

/// A raw coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Errors raised while parsing a geofence boundary payload.
#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("boundary is not an array of [lat, lng] pairs: {0}")]
    Malformed(String),

    #[error("boundary has {0} vertices, at least 3 required")]
    TooFewVertices(usize),
}

/// Parses a boundary payload into an ordered vertex list.
///
/// The payload must be a JSON array of two-element `[lat, lng]` number
/// arrays with at least three entries.
pub fn parse_boundary(boundary: &serde_json::Value) -> Result<Vec<LatLng>, BoundaryError> {
    let pairs: Vec<[f64; 2]> = Vec::<[f64; 2]>::deserialize(boundary)
        .map_err(|e| BoundaryError::Malformed(e.to_string()))?;

    if pairs.len() < 3 {
        return Err(BoundaryError::TooFewVertices(pairs.len()));
    }

    Ok(pairs
        .into_iter()
        .map(|[lat, lng]| LatLng::new(lat, lng))
        .collect())
}

/// Even-odd (ray casting) point-in-polygon test.
///
/// The closing edge is implied by wraparound from the last vertex back to
/// the first. Polygons with fewer than 3 vertices never match. Points
/// exactly on an edge fall on whichever side the half-open latitude
/// interval puts them; the outcome is deterministic but intentionally
/// unspecified.
pub fn contains(point: LatLng, polygon: &[LatLng]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let vi = polygon[i];
        let vj = polygon[j];

        // Half-open on the latitude axis: an edge counts when the point's
        // latitude is within [min(vi, vj), max(vi, vj)) of the edge span.
        if (vi.latitude > point.latitude) != (vj.latitude > point.latitude) {
            let crossing_lng = (vj.longitude - vi.longitude)
                * (point.latitude - vi.latitude)
                / (vj.latitude - vi.latitude)
                + vi.longitude;
            if point.longitude < crossing_lng {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// True if the point lies inside any active geofence.
///
/// A fence whose boundary fails to parse is logged and skipped; evaluation
/// continues over the remaining fences so one bad payload cannot take the
/// whole containment check down.
pub fn is_in_any_safe_zone(point: LatLng, geofences: &[Geofence]) -> bool {
    geofences
        .iter()
        .filter(|fence| fence.active)
        .any(|fence| match parse_boundary(&fence.boundary) {
            Ok(polygon) => contains(point, &polygon),
            Err(e) => {
                warn!(
                    geofence_id = %fence.geofence_id,
                    name = %fence.name,
                    error = %e,
                    "Skipping geofence with unusable boundary"
                );
                false
            }
        })
}
