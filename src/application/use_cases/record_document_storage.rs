use std::sync::Arc;
use tracing::info;

use crate::domain::entities::Document;
use crate::domain::repositories::{
    DocumentRepository, document_repository::DocumentRepositoryError,
};
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum RecordStorageError {
    DocumentNotFound(Identifier),
    ValidationError(String),
    RepositoryError(String),
}

impl std::fmt::Display for RecordStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordStorageError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            RecordStorageError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            RecordStorageError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for RecordStorageError {}

impl From<DocumentRepositoryError> for RecordStorageError {
    fn from(error: DocumentRepositoryError) -> Self {
        match error {
            DocumentRepositoryError::NotFound(id) => RecordStorageError::DocumentNotFound(id),
            _ => RecordStorageError::RepositoryError(error.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordStorageRequest {
    pub document_id: Identifier,
    pub storage_url: String,
    pub file_size: i64,
}

/// The single post-upload mutation a document receives.
pub struct RecordDocumentStorageUseCase {
    document_repository: Arc<dyn DocumentRepository>,
}

impl RecordDocumentStorageUseCase {
    pub fn new(document_repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            document_repository,
        }
    }

    pub async fn execute(&self, request: RecordStorageRequest) -> Result<Document, RecordStorageError> {
        let mut document = self
            .document_repository
            .find_by_id(&request.document_id)
            .await?
            .ok_or_else(|| RecordStorageError::DocumentNotFound(request.document_id.clone()))?;

        document
            .record_storage(request.storage_url, request.file_size)
            .map_err(RecordStorageError::ValidationError)?;
        self.document_repository.update_storage(&document).await?;

        info!(
            "Recorded storage for {} ({} bytes)",
            document.id(),
            request.file_size
        );
        Ok(document)
    }
}
