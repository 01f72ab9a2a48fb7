use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::application::services::IdentifierService;
use crate::application::services::identifier_service::IdentifierServiceError;
use crate::domain::entities::{Document, Publication};
use crate::domain::repositories::{DocumentRepository, PublicationRepository};
use crate::domain::value_objects::{DocumentType, EntityKind};

#[derive(Debug)]
pub enum RegisterPublicationError {
    ValidationError(String),
    IdentifierError(String),
    RepositoryError(String),
}

impl std::fmt::Display for RegisterPublicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegisterPublicationError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            RegisterPublicationError::IdentifierError(msg) => write!(f, "Identifier error: {}", msg),
            RegisterPublicationError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for RegisterPublicationError {}

impl From<IdentifierServiceError> for RegisterPublicationError {
    fn from(error: IdentifierServiceError) -> Self {
        RegisterPublicationError::IdentifierError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RegisterDocumentRequest {
    pub document_type: DocumentType,
    pub download_url: Url,
    pub description: String,
    pub mime_type: String,
    pub charset: String,
    pub language: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegisterPublicationRequest {
    pub title: String,
    pub abstract_text: Option<String>,
    pub citation: String,
    pub authors: Vec<String>,
    pub publication_date: NaiveDate,
    pub source: String,
    pub source_url: Url,
    pub uri: Url,
    pub documents: Vec<RegisterDocumentRequest>,
}

#[derive(Debug, Clone)]
pub struct RegisterPublicationResponse {
    pub publication: Publication,
    pub documents: Vec<Document>,
}

/// Catalogs a scraped publication and its files. Re-registering the same source URL returns
/// the identifiers issued the first time and leaves stored rows untouched.
pub struct RegisterPublicationUseCase {
    identifier_service: Arc<IdentifierService>,
    publication_repository: Arc<dyn PublicationRepository>,
    document_repository: Arc<dyn DocumentRepository>,
}

impl RegisterPublicationUseCase {
    pub fn new(
        identifier_service: Arc<IdentifierService>,
        publication_repository: Arc<dyn PublicationRepository>,
        document_repository: Arc<dyn DocumentRepository>,
    ) -> Self {
        Self {
            identifier_service,
            publication_repository,
            document_repository,
        }
    }

    pub async fn execute(
        &self,
        request: RegisterPublicationRequest,
    ) -> Result<RegisterPublicationResponse, RegisterPublicationError> {
        let mut keys = vec![(EntityKind::Publication, request.source_url.as_str())];
        for document in &request.documents {
            if request
                .documents
                .iter()
                .filter(|d| d.download_url == document.download_url)
                .count()
                > 1
            {
                return Err(RegisterPublicationError::ValidationError(format!(
                    "Download URL listed twice: {}",
                    document.download_url
                )));
            }
            keys.push((EntityKind::Document, document.download_url.as_str()));
        }

        let mut identifiers = self.identifier_service.allocate_all(&keys).await?.into_iter();
        let publication_id = identifiers.next().ok_or_else(|| {
            RegisterPublicationError::IdentifierError("no publication identifier".to_string())
        })?;

        let publication = Publication::new(
            publication_id.clone(),
            request.title,
            request.abstract_text,
            request.citation,
            request.authors,
            request.publication_date,
            request.source,
            request.source_url,
            request.uri,
        )
        .map_err(RegisterPublicationError::ValidationError)?;

        self.publication_repository
            .save(&publication)
            .await
            .map_err(|e| RegisterPublicationError::RepositoryError(e.to_string()))?;

        let mut documents = Vec::with_capacity(request.documents.len());
        for (document, document_id) in request.documents.into_iter().zip(identifiers) {
            let document = Document::new(
                document_id,
                publication_id.clone(),
                document.document_type,
                document.download_url,
                document.description,
                document.mime_type,
                document.charset,
                document.language,
                document.version,
            );
            self.document_repository
                .save(&document)
                .await
                .map_err(|e| RegisterPublicationError::RepositoryError(e.to_string()))?;
            documents.push(document);
        }

        info!(
            "Registered publication {} with {} documents",
            publication.id(),
            documents.len()
        );

        Ok(RegisterPublicationResponse {
            publication,
            documents,
        })
    }
}
