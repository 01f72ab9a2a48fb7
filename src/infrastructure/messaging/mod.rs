pub mod ingestion_worker;
pub mod mpsc_job_queue;

pub use ingestion_worker::IngestionWorkerPool;
pub use mpsc_job_queue::MpscJobQueue;
