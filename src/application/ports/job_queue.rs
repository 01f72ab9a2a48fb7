use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::IngestionJob;

#[derive(Debug)]
pub enum JobQueueError {
    QueueFull,
    ConnectionError(String),
    InvalidJob(String),
}

impl std::fmt::Display for JobQueueError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobQueueError::QueueFull => write!(f, "Job queue is full"),
            JobQueueError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            JobQueueError::InvalidJob(msg) => write!(f, "Invalid job: {}", msg),
        }
    }
}

impl std::error::Error for JobQueueError {}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a pending ingestion job
    async fn enqueue(&self, job: IngestionJob) -> Result<(), JobQueueError>;

    /// Wait for the next job
    async fn dequeue(&self) -> Result<IngestionJob, JobQueueError>;

    /// Take a job if one is waiting
    async fn try_dequeue(&self) -> Result<Option<IngestionJob>, JobQueueError>;

    async fn size(&self) -> Result<usize, JobQueueError>;

    /// Drop a waiting job so no worker picks it up
    async fn remove_job(&self, job_id: Uuid) -> Result<bool, JobQueueError>;

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError>;
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QueueHealth {
    pub queue_size: usize,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub is_healthy: bool,
    pub last_activity: Option<chrono::DateTime<chrono::Utc>>,
}
