use std::sync::Arc;

use crate::application::services::EmbeddingService;
use crate::application::services::embedding_service::EmbeddingBatchReport;
use crate::domain::repositories::GraphRepository;
use crate::domain::value_objects::{ContentNodeType, Identifier};

#[derive(Debug)]
pub enum EmbedDocumentError {
    NotIngested(Identifier),
    RepositoryError(String),
    EmbeddingError(String),
}

impl std::fmt::Display for EmbedDocumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbedDocumentError::NotIngested(id) => {
                write!(f, "Document {} has no ingested graph", id)
            }
            EmbedDocumentError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            EmbedDocumentError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
        }
    }
}

impl std::error::Error for EmbedDocumentError {}

#[derive(Debug, Clone)]
pub struct EmbedDocumentRequest {
    pub document_id: Identifier,
    /// Only embed nodes of these types; all types when empty.
    pub node_types: Vec<ContentNodeType>,
}

pub struct EmbedDocumentUseCase {
    graph_repository: Arc<dyn GraphRepository>,
    embedding_service: Arc<EmbeddingService>,
}

impl EmbedDocumentUseCase {
    pub fn new(
        graph_repository: Arc<dyn GraphRepository>,
        embedding_service: Arc<EmbeddingService>,
    ) -> Self {
        Self {
            graph_repository,
            embedding_service,
        }
    }

    pub async fn execute(
        &self,
        request: EmbedDocumentRequest,
    ) -> Result<EmbeddingBatchReport, EmbedDocumentError> {
        let graph = self
            .graph_repository
            .load(&request.document_id)
            .await
            .map_err(|e| EmbedDocumentError::RepositoryError(e.to_string()))?;
        if graph.nodes().is_empty() {
            return Err(EmbedDocumentError::NotIngested(request.document_id));
        }

        let nodes: Vec<_> = graph
            .reading_order(true)
            .into_iter()
            .filter(|n| request.node_types.is_empty() || request.node_types.contains(&n.node_type()))
            .cloned()
            .collect();

        self.embedding_service
            .embed_nodes(&nodes)
            .await
            .map_err(|e| EmbedDocumentError::EmbeddingError(e.to_string()))
    }
}
