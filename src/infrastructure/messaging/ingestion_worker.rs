use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::ports::JobQueue;
use crate::application::ports::job_queue::JobQueueError;
use crate::application::services::IngestionService;
use crate::domain::entities::IngestionJob;

/// Pool of tasks that drain the job queue and run each job through the ingestion service.
#[derive(Clone)]
pub struct IngestionWorkerPool {
    job_queue: Arc<dyn JobQueue>,
    ingestion_service: Arc<IngestionService>,
    worker_count: usize,
}

impl IngestionWorkerPool {
    pub fn new(job_queue: Arc<dyn JobQueue>, ingestion_service: Arc<IngestionService>) -> Self {
        Self {
            job_queue,
            ingestion_service,
            worker_count: 3,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Spawns the workers; each runs until the queue is closed.
    pub fn start(&self) -> Vec<JoinHandle<()>> {
        info!("Starting ingestion workers: {}", self.worker_count);

        (0..self.worker_count)
            .map(|worker_id| {
                let pool = self.clone();
                tokio::spawn(async move { pool.worker_loop(worker_id).await })
            })
            .collect()
    }

    async fn worker_loop(&self, worker_id: usize) {
        info!("Worker {} started", worker_id);

        loop {
            match self.job_queue.dequeue().await {
                Ok(job) => self.process_job(worker_id, job).await,
                Err(JobQueueError::ConnectionError(msg)) => {
                    info!("Worker {} stopping: {}", worker_id, msg);
                    break;
                }
                Err(e) => warn!("Worker {} could not take a job: {}", worker_id, e),
            }
        }
    }

    async fn process_job(&self, worker_id: usize, mut job: IngestionJob) {
        let job_id = job.id();
        info!(
            "Worker {} processing job {} for {}",
            worker_id,
            job_id,
            job.document_id()
        );

        match self.ingestion_service.run_job(&mut job).await {
            Ok(outcome) => match outcome.error_code {
                Some(code) => warn!(
                    "Job {} failed with {}: {}",
                    job_id,
                    code,
                    outcome.job.error_message().unwrap_or_default()
                ),
                None => info!(
                    "Job {} finished as {} with {} warnings",
                    job_id,
                    outcome.job.status(),
                    outcome.warnings.len()
                ),
            },
            Err(e) => error!("Job {} could not be recorded: {}", job_id, e),
        }
    }
}
