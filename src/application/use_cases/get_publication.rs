use std::sync::Arc;

use crate::domain::entities::{Document, Publication};
use crate::domain::repositories::{
    DocumentRepository, PublicationRepository,
    publication_repository::PublicationRepositoryError,
};
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum GetPublicationError {
    PublicationNotFound(Identifier),
    RepositoryError(String),
    ValidationError(String),
}

impl std::fmt::Display for GetPublicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GetPublicationError::PublicationNotFound(id) => {
                write!(f, "Publication not found: {}", id)
            }
            GetPublicationError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            GetPublicationError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for GetPublicationError {}

impl From<PublicationRepositoryError> for GetPublicationError {
    fn from(error: PublicationRepositoryError) -> Self {
        match error {
            PublicationRepositoryError::NotFound(id) => GetPublicationError::PublicationNotFound(id),
            _ => GetPublicationError::RepositoryError(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListPublicationsResponse {
    pub publications: Vec<Publication>,
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

pub struct GetPublicationUseCase {
    publication_repository: Arc<dyn PublicationRepository>,
    document_repository: Arc<dyn DocumentRepository>,
}

impl GetPublicationUseCase {
    pub fn new(
        publication_repository: Arc<dyn PublicationRepository>,
        document_repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            publication_repository,
            document_repository,
        }
    }

    pub async fn execute(&self, publication_id: &Identifier) -> Result<Publication, GetPublicationError> {
        self.publication_repository
            .find_by_id(publication_id)
            .await?
            .ok_or_else(|| GetPublicationError::PublicationNotFound(publication_id.clone()))
    }

    pub async fn documents(
        &self,
        publication_id: &Identifier,
    ) -> Result<Vec<Document>, GetPublicationError> {
        self.execute(publication_id).await?;
        self.document_repository
            .find_by_publication(publication_id)
            .await
            .map_err(|e| GetPublicationError::RepositoryError(e.to_string()))
    }

    pub async fn list(&self, skip: i64, limit: i64) -> Result<ListPublicationsResponse, GetPublicationError> {
        if skip < 0 {
            return Err(GetPublicationError::ValidationError(
                "Skip cannot be negative".to_string(),
            ));
        }
        if limit <= 0 || limit > 1000 {
            return Err(GetPublicationError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let publications = self.publication_repository.find_all(skip, limit).await?;
        let total_count = self.publication_repository.count().await?;

        Ok(ListPublicationsResponse {
            publications,
            total_count,
            skip,
            limit,
        })
    }
}
