use std::sync::Arc;

use crate::application::services::IngestionService;
use crate::application::services::ingestion_service::{IngestionOutcome, IngestionServiceError};
use crate::domain::repositories::PublicationRepository;
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum IngestPublicationError {
    PublicationNotFound(Identifier),
    RepositoryError(String),
    IngestionError(String),
}

impl std::fmt::Display for IngestPublicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestPublicationError::PublicationNotFound(id) => {
                write!(f, "Publication not found: {}", id)
            }
            IngestPublicationError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            IngestPublicationError::IngestionError(msg) => write!(f, "Ingestion error: {}", msg),
        }
    }
}

impl std::error::Error for IngestPublicationError {}

impl From<IngestionServiceError> for IngestPublicationError {
    fn from(error: IngestionServiceError) -> Self {
        IngestPublicationError::IngestionError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct IngestPublicationResponse {
    pub publication_id: Identifier,
    pub outcomes: Vec<IngestionOutcome>,
}

impl IngestPublicationResponse {
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.job.status().is_failed())
            .count()
    }
}

pub struct IngestPublicationUseCase {
    publication_repository: Arc<dyn PublicationRepository>,
    ingestion_service: Arc<IngestionService>,
}

impl IngestPublicationUseCase {
    pub fn new(
        publication_repository: Arc<dyn PublicationRepository>,
        ingestion_service: Arc<IngestionService>,
    ) -> Self {
        Self {
            publication_repository,
            ingestion_service,
        }
    }

    pub async fn execute(
        &self,
        publication_id: &Identifier,
    ) -> Result<IngestPublicationResponse, IngestPublicationError> {
        self.publication_repository
            .find_by_id(publication_id)
            .await
            .map_err(|e| IngestPublicationError::RepositoryError(e.to_string()))?
            .ok_or_else(|| IngestPublicationError::PublicationNotFound(publication_id.clone()))?;

        let mut outcomes = self
            .ingestion_service
            .ingest_publication(publication_id)
            .await?;
        outcomes.sort_by(|a, b| a.job.document_id().cmp(b.job.document_id()));

        Ok(IngestPublicationResponse {
            publication_id: publication_id.clone(),
            outcomes,
        })
    }
}
