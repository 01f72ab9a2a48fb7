pub mod document_repository;
pub mod embedding_repository;
pub mod graph_repository;
pub mod job_repository;
pub mod publication_repository;

pub use document_repository::DocumentRepository;
pub use embedding_repository::EmbeddingRepository;
pub use graph_repository::GraphRepository;
pub use job_repository::JobRepository;
pub use publication_repository::PublicationRepository;
