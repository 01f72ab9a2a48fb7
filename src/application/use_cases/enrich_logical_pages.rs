use std::sync::Arc;
use tracing::info;

use crate::domain::repositories::{GraphRepository, graph_repository::GraphRepositoryError};
use crate::domain::value_objects::{Identifier, LogicalPageMap};

#[derive(Debug)]
pub enum EnrichLogicalPagesError {
    NotIngested(Identifier),
    ValidationError(String),
    RepositoryError(String),
}

impl std::fmt::Display for EnrichLogicalPagesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichLogicalPagesError::NotIngested(id) => {
                write!(f, "Document {} has no ingested graph", id)
            }
            EnrichLogicalPagesError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            EnrichLogicalPagesError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for EnrichLogicalPagesError {}

impl From<GraphRepositoryError> for EnrichLogicalPagesError {
    fn from(error: GraphRepositoryError) -> Self {
        EnrichLogicalPagesError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichLogicalPagesResponse {
    pub positions_labelled: usize,
    pub nodes_updated: usize,
}

/// Post-pass that writes human page labels into positional data. Sequence numbers are never
/// touched.
pub struct EnrichLogicalPagesUseCase {
    graph_repository: Arc<dyn GraphRepository>,
}

impl EnrichLogicalPagesUseCase {
    pub fn new(graph_repository: Arc<dyn GraphRepository>) -> Self {
        Self { graph_repository }
    }

    pub async fn execute(
        &self,
        document_id: &Identifier,
        labels: &LogicalPageMap,
    ) -> Result<EnrichLogicalPagesResponse, EnrichLogicalPagesError> {
        if labels.is_empty() {
            return Err(EnrichLogicalPagesError::ValidationError(
                "No page labels or numbering given".to_string(),
            ));
        }

        let mut graph = self.graph_repository.load(document_id).await?;
        if graph.nodes().is_empty() {
            return Err(EnrichLogicalPagesError::NotIngested(document_id.clone()));
        }

        let positions_labelled = graph.apply_logical_pages(labels);
        let updates: Vec<_> = graph
            .nodes()
            .iter()
            .filter(|node| !node.positional_data().is_empty())
            .map(|node| (node.id().clone(), node.positional_data().clone()))
            .collect();
        let nodes_updated = self
            .graph_repository
            .update_positional_data(&updates)
            .await?;

        info!(
            "Labelled {} positions across {} nodes of {}",
            positions_labelled, nodes_updated, document_id
        );
        Ok(EnrichLogicalPagesResponse {
            positions_labelled,
            nodes_updated,
        })
    }
}
