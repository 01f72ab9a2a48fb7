use async_trait::async_trait;

use crate::domain::entities::Document;
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum DocumentRepositoryError {
    NotFound(Identifier),
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for DocumentRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentRepositoryError::NotFound(id) => write!(f, "Document not found: {}", id),
            DocumentRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            DocumentRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentRepositoryError {}

#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Inserts a new document; an existing identifier is left untouched.
    async fn save(&self, document: &Document) -> Result<(), DocumentRepositoryError>;
    async fn find_by_id(&self, id: &Identifier)
    -> Result<Option<Document>, DocumentRepositoryError>;
    async fn find_by_publication(
        &self,
        publication_id: &Identifier,
    ) -> Result<Vec<Document>, DocumentRepositoryError>;
    /// Persists the storage location and size, the only mutable document fields.
    async fn update_storage(&self, document: &Document) -> Result<(), DocumentRepositoryError>;
}
