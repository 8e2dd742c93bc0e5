//! Geofence repository contract.

use domain::models::Geofence;
use uuid::Uuid;

use crate::error::RepositoryError;

/// Repository for safe-zone polygons. The engine reads fences for
/// evaluation; editing happens on external surfaces.
#[async_trait::async_trait]
pub trait GeofenceRepository: Send + Sync {
    async fn insert(&self, geofence: Geofence) -> Result<Geofence, RepositoryError>;

    async fn find_by_id(&self, geofence_id: Uuid) -> Result<Option<Geofence>, RepositoryError>;

    /// All fences with `active = true`.
    async fn find_active(&self) -> Result<Vec<Geofence>, RepositoryError>;
}
