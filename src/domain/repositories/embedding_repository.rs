use async_trait::async_trait;
use pgvector::Vector;

use crate::domain::entities::{ContentNode, Embedding};
use crate::domain::value_objects::{ContentNodeType, Identifier};

#[derive(Debug)]
pub enum EmbeddingRepositoryError {
    NotFound(Identifier),
    DatabaseError(String),
    ValidationError(String),
    VectorError(String),
}

impl std::fmt::Display for EmbeddingRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingRepositoryError::NotFound(id) => write!(f, "Embedding not found: {}", id),
            EmbeddingRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            EmbeddingRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            EmbeddingRepositoryError::VectorError(msg) => write!(f, "Vector error: {}", msg),
        }
    }
}

impl std::error::Error for EmbeddingRepositoryError {}

#[derive(Debug, Clone)]
pub struct SimilaritySearchResult {
    pub embedding: Embedding,
    pub node: ContentNode,
    pub similarity_score: f32,
}

/// Filters applied before ranking by vector distance.
///
/// Only the newest embedding of each node is ranked; `model_name` further
/// requires that row to come from the given model.
#[derive(Debug, Clone, Default)]
pub struct SimilarityFilter {
    pub node_type: Option<ContentNodeType>,
    pub document_id: Option<Identifier>,
    pub model_name: Option<String>,
    pub similarity_threshold: Option<f32>,
}

#[async_trait]
pub trait EmbeddingRepository: Send + Sync {
    /// Embeddings whose identifier already exists are skipped.
    async fn save_batch(&self, embeddings: &[Embedding]) -> Result<usize, EmbeddingRepositoryError>;
    async fn find_by_node(
        &self,
        node_id: &Identifier,
    ) -> Result<Vec<Embedding>, EmbeddingRepositoryError>;
    async fn similarity_search(
        &self,
        query_vector: &Vector,
        filter: &SimilarityFilter,
        limit: i64,
    ) -> Result<Vec<SimilaritySearchResult>, EmbeddingRepositoryError>;
}
