use std::sync::Arc;

use crate::application::ports::{FragmentSource, JobQueue, job_queue::JobQueueError};
use crate::domain::entities::IngestionJob;
use crate::domain::graph::Fragment;
use crate::domain::repositories::{
    DocumentRepository, JobRepository, job_repository::JobRepositoryError,
};
use crate::domain::value_objects::Identifier;

#[derive(Debug)]
pub enum QueueIngestionError {
    DocumentNotFound(Identifier),
    FragmentsMissing(Identifier),
    AlreadyQueued(Identifier),
    RepositoryError(String),
    QueueError(String),
}

impl std::fmt::Display for QueueIngestionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueIngestionError::DocumentNotFound(id) => write!(f, "Document not found: {}", id),
            QueueIngestionError::FragmentsMissing(id) => {
                write!(f, "No fragment stream available for {}", id)
            }
            QueueIngestionError::AlreadyQueued(id) => {
                write!(f, "Document {} already has an active ingestion job", id)
            }
            QueueIngestionError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            QueueIngestionError::QueueError(msg) => write!(f, "Queue error: {}", msg),
        }
    }
}

impl std::error::Error for QueueIngestionError {}

impl From<JobRepositoryError> for QueueIngestionError {
    fn from(error: JobRepositoryError) -> Self {
        QueueIngestionError::RepositoryError(error.to_string())
    }
}

impl From<JobQueueError> for QueueIngestionError {
    fn from(error: JobQueueError) -> Self {
        QueueIngestionError::QueueError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct QueueIngestionRequest {
    pub document_id: Identifier,
    /// Replaces the stored stream before the job is queued.
    pub fragments: Option<Vec<Fragment>>,
}

pub struct QueueIngestionUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    job_repository: Arc<dyn JobRepository>,
    fragment_source: Arc<dyn FragmentSource>,
    job_queue: Arc<dyn JobQueue>,
}

impl QueueIngestionUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        job_repository: Arc<dyn JobRepository>,
        fragment_source: Arc<dyn FragmentSource>,
        job_queue: Arc<dyn JobQueue>,
    ) -> Self {
        Self {
            document_repository,
            job_repository,
            fragment_source,
            job_queue,
        }
    }

    pub async fn execute(
        &self,
        request: QueueIngestionRequest,
    ) -> Result<IngestionJob, QueueIngestionError> {
        let document_id = request.document_id;
        self.document_repository
            .find_by_id(&document_id)
            .await
            .map_err(|e| QueueIngestionError::RepositoryError(e.to_string()))?
            .ok_or_else(|| QueueIngestionError::DocumentNotFound(document_id.clone()))?;

        let existing = self.job_repository.find_by_document(&document_id).await?;
        if existing.iter().any(|job| job.is_active()) {
            return Err(QueueIngestionError::AlreadyQueued(document_id));
        }

        match request.fragments {
            Some(fragments) => self
                .fragment_source
                .store(&document_id, &fragments)
                .await
                .map_err(|e| QueueIngestionError::RepositoryError(e.to_string()))?,
            None => {
                let available = self
                    .fragment_source
                    .exists(&document_id)
                    .await
                    .map_err(|e| QueueIngestionError::RepositoryError(e.to_string()))?;
                if !available {
                    return Err(QueueIngestionError::FragmentsMissing(document_id));
                }
            }
        }

        let job = IngestionJob::new(document_id);
        self.job_repository.save(&job).await?;
        self.job_queue.enqueue(job.clone()).await?;

        Ok(job)
    }
}
