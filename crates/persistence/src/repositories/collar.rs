//! Collar repository contract.

use chrono::{DateTime, Utc};
use domain::models::Collar;
use uuid::Uuid;

use crate::error::RepositoryError;

/// Repository for collar state.
#[async_trait::async_trait]
pub trait CollarRepository: Send + Sync {
    async fn insert(&self, collar: Collar) -> Result<Collar, RepositoryError>;

    async fn find_by_id(&self, collar_id: Uuid) -> Result<Option<Collar>, RepositoryError>;

    async fn find_by_animal_id(
        &self,
        animal_id: Uuid,
    ) -> Result<Option<Collar>, RepositoryError>;

    /// Applies a heard-from-collar update: battery (when reported),
    /// `online = true`, `last_signal_at = now`. Returns `None` if the
    /// collar is unknown.
    async fn record_signal(
        &self,
        collar_id: Uuid,
        battery_level: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<Option<Collar>, RepositoryError>;

    /// Flips the online flag. Returns `None` if the collar is unknown.
    async fn set_online(
        &self,
        collar_id: Uuid,
        online: bool,
    ) -> Result<Option<Collar>, RepositoryError>;

    /// Collars eligible for connectivity monitoring: assigned to an
    /// animal and having signalled at least once.
    async fn find_monitorable(&self) -> Result<Vec<Collar>, RepositoryError>;
}
