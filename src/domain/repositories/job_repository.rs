use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum JobRepositoryError {
    NotFound(Uuid),
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for JobRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobRepositoryError::NotFound(id) => write!(f, "Job not found: {}", id),
            JobRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            JobRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for JobRepositoryError {}

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save(&self, job: &IngestionJob) -> Result<(), JobRepositoryError>;
    async fn find_by_id(&self, job_id: Uuid) -> Result<Option<IngestionJob>, JobRepositoryError>;
    /// Newest first.
    async fn find_by_document(
        &self,
        document_id: &Identifier,
    ) -> Result<Vec<IngestionJob>, JobRepositoryError>;
    /// Most recent job that committed the document's graph.
    async fn last_ingested(
        &self,
        document_id: &Identifier,
    ) -> Result<Option<IngestionJob>, JobRepositoryError>;
    async fn update(&self, job: &IngestionJob) -> Result<(), JobRepositoryError>;
    async fn find_active_jobs(&self) -> Result<Vec<IngestionJob>, JobRepositoryError>;
}
