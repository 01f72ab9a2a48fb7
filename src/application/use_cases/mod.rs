pub mod embed_document;
pub mod enrich_logical_pages;
pub mod get_job_status;
pub mod get_publication;
pub mod ingest_publication;
pub mod queue_ingestion;
pub mod record_document_storage;
pub mod register_publication;

pub use embed_document::EmbedDocumentUseCase;
pub use enrich_logical_pages::EnrichLogicalPagesUseCase;
pub use get_job_status::GetJobStatusUseCase;
pub use get_publication::GetPublicationUseCase;
pub use ingest_publication::IngestPublicationUseCase;
pub use queue_ingestion::QueueIngestionUseCase;
pub use record_document_storage::RecordDocumentStorageUseCase;
pub use register_publication::RegisterPublicationUseCase;
