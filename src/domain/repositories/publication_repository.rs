use async_trait::async_trait;

use crate::domain::entities::Publication;
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum PublicationRepositoryError {
    NotFound(Identifier),
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for PublicationRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublicationRepositoryError::NotFound(id) => write!(f, "Publication not found: {}", id),
            PublicationRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            PublicationRepositoryError::ValidationError(msg) => {
                write!(f, "Validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PublicationRepositoryError {}

/// Publications are append-only: saving an existing identifier is a no-op.
#[async_trait]
pub trait PublicationRepository: Send + Sync {
    async fn save(&self, publication: &Publication) -> Result<(), PublicationRepositoryError>;
    async fn find_by_id(
        &self,
        id: &Identifier,
    ) -> Result<Option<Publication>, PublicationRepositoryError>;
    async fn find_all(
        &self,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Publication>, PublicationRepositoryError>;
    async fn count(&self) -> Result<i64, PublicationRepositoryError>;
}
