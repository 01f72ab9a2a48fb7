use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::application::ports::job_queue::{JobQueue, JobQueueError, QueueHealth};
use crate::domain::entities::IngestionJob;

/// In-process queue shared by the HTTP layer (producer) and the ingestion workers (consumers).
pub struct MpscJobQueue {
    sender: mpsc::UnboundedSender<IngestionJob>,
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<IngestionJob>>>,
    /// Ids still waiting; a job removed from here is dropped when it reaches the head.
    waiting: Arc<Mutex<HashSet<Uuid>>>,
    stats: Arc<Mutex<QueueStats>>,
}

#[derive(Debug, Clone, Default)]
struct QueueStats {
    total_enqueued: u64,
    total_dequeued: u64,
    last_activity: Option<chrono::DateTime<chrono::Utc>>,
}

impl MpscJobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
            waiting: Arc::new(Mutex::new(HashSet::new())),
            stats: Arc::new(Mutex::new(QueueStats::default())),
        }
    }

    /// Claims a received job unless it was removed while waiting.
    async fn claim(&self, job: IngestionJob) -> Option<IngestionJob> {
        if !self.waiting.lock().await.remove(&job.id()) {
            return None;
        }

        let mut stats = self.stats.lock().await;
        stats.total_dequeued += 1;
        stats.last_activity = Some(chrono::Utc::now());
        Some(job)
    }
}

#[async_trait]
impl JobQueue for MpscJobQueue {
    async fn enqueue(&self, job: IngestionJob) -> Result<(), JobQueueError> {
        if !job.status().is_pending() {
            return Err(JobQueueError::InvalidJob(format!(
                "Job {} is {}, only pending jobs can be queued",
                job.id(),
                job.status()
            )));
        }

        self.waiting.lock().await.insert(job.id());

        self.sender
            .send(job)
            .map_err(|_| JobQueueError::ConnectionError("Channel closed".to_string()))?;

        let mut stats = self.stats.lock().await;
        stats.total_enqueued += 1;
        stats.last_activity = Some(chrono::Utc::now());

        Ok(())
    }

    async fn dequeue(&self) -> Result<IngestionJob, JobQueueError> {
        loop {
            let job = {
                let mut receiver = self.receiver.lock().await;
                receiver.recv().await
            };

            match job {
                Some(job) => {
                    if let Some(job) = self.claim(job).await {
                        return Ok(job);
                    }
                }
                None => return Err(JobQueueError::ConnectionError("Channel closed".to_string())),
            }
        }
    }

    async fn try_dequeue(&self) -> Result<Option<IngestionJob>, JobQueueError> {
        loop {
            let job = {
                let mut receiver = self.receiver.lock().await;
                receiver.try_recv()
            };

            match job {
                Ok(job) => {
                    if let Some(job) = self.claim(job).await {
                        return Ok(Some(job));
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => return Ok(None),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    return Err(JobQueueError::ConnectionError("Channel closed".to_string()));
                }
            }
        }
    }

    async fn size(&self) -> Result<usize, JobQueueError> {
        Ok(self.waiting.lock().await.len())
    }

    async fn remove_job(&self, job_id: Uuid) -> Result<bool, JobQueueError> {
        Ok(self.waiting.lock().await.remove(&job_id))
    }

    async fn health_check(&self) -> Result<QueueHealth, JobQueueError> {
        let waiting = self.waiting.lock().await;
        let stats = self.stats.lock().await;

        Ok(QueueHealth {
            queue_size: waiting.len(),
            total_enqueued: stats.total_enqueued,
            total_dequeued: stats.total_dequeued,
            is_healthy: !self.sender.is_closed(),
            last_activity: stats.last_activity,
        })
    }
}

impl Default for MpscJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Identifier;

    fn job(document: &str) -> IngestionJob {
        IngestionJob::new(Identifier::parse(document).unwrap())
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MpscJobQueue::new();
        let first = job("doc_001");
        let second = job("doc_002");
        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();
        assert_eq!(queue.size().await.unwrap(), 2);

        assert_eq!(queue.dequeue().await.unwrap().id(), first.id());
        assert_eq!(queue.try_dequeue().await.unwrap().map(|j| j.id()), Some(second.id()));
        assert!(queue.try_dequeue().await.unwrap().is_none());

        let health = queue.health_check().await.unwrap();
        assert_eq!(health.total_enqueued, 2);
        assert_eq!(health.total_dequeued, 2);
        assert!(health.is_healthy);
    }

    #[tokio::test]
    async fn test_removed_job_is_skipped() {
        let queue = MpscJobQueue::new();
        let removed = job("doc_001");
        let kept = job("doc_002");
        queue.enqueue(removed.clone()).await.unwrap();
        queue.enqueue(kept.clone()).await.unwrap();

        assert!(queue.remove_job(removed.id()).await.unwrap());
        assert!(!queue.remove_job(removed.id()).await.unwrap());

        assert_eq!(queue.dequeue().await.unwrap().id(), kept.id());
        assert_eq!(queue.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_only_pending_jobs_are_accepted() {
        let queue = MpscJobQueue::new();
        let mut started = job("doc_001");
        started.start().unwrap();

        assert!(matches!(
            queue.enqueue(started).await,
            Err(JobQueueError::InvalidJob(_))
        ));
    }
}
