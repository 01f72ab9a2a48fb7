pub mod content_node;
pub mod document;
pub mod document_component;
pub mod embedding;
pub mod ingestion_job;
pub mod publication;
pub mod relation;

pub use content_node::{ContentNode, EmbeddingTextError};
pub use document::Document;
pub use document_component::DocumentComponent;
pub use embedding::Embedding;
pub use ingestion_job::{IngestionJob, IngestionReport};
pub use publication::Publication;
pub use relation::Relation;
