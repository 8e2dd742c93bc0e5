//! Animal repository contract.

use domain::models::Animal;
use uuid::Uuid;

use crate::error::RepositoryError;

/// Repository for tracked animals. The engine only reads animals; CRUD
/// lives on external surfaces.
#[async_trait::async_trait]
pub trait AnimalRepository: Send + Sync {
    async fn insert(&self, animal: Animal) -> Result<Animal, RepositoryError>;

    async fn find_by_id(&self, animal_id: Uuid) -> Result<Option<Animal>, RepositoryError>;

    async fn list(&self) -> Result<Vec<Animal>, RepositoryError>;
}
