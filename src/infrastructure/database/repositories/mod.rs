pub mod postgres_document_repository;
pub mod postgres_embedding_repository;
pub mod postgres_graph_repository;
pub mod postgres_job_repository;
pub mod postgres_publication_repository;

pub use postgres_document_repository::PostgresDocumentRepository;
pub use postgres_embedding_repository::PostgresEmbeddingRepository;
pub use postgres_graph_repository::PostgresGraphRepository;
pub use postgres_job_repository::PostgresJobRepository;
pub use postgres_publication_repository::PostgresPublicationRepository;
