//! Position report repository contract.

use domain::models::PositionReport;
use uuid::Uuid;

use crate::error::RepositoryError;

/// Append-only repository for position reports.
#[async_trait::async_trait]
pub trait PositionRepository: Send + Sync {
    async fn append(&self, report: PositionReport) -> Result<PositionReport, RepositoryError>;

    /// The most recent report for an animal.
    async fn find_latest(
        &self,
        animal_id: Uuid,
    ) -> Result<Option<PositionReport>, RepositoryError>;

    /// Recent reports for an animal, newest first, capped at `limit`.
    async fn find_for_animal(
        &self,
        animal_id: Uuid,
        limit: usize,
    ) -> Result<Vec<PositionReport>, RepositoryError>;
}
