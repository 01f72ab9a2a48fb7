pub mod embedding_service;
pub mod identifier_service;
pub mod ingestion_service;
pub mod query_service;

pub use embedding_service::EmbeddingService;
pub use identifier_service::IdentifierService;
pub use ingestion_service::IngestionService;
pub use query_service::QueryService;
