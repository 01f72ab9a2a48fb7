use async_trait::async_trait;

use crate::domain::entities::{ContentNode, DocumentComponent, Relation};
use crate::domain::graph::{DocumentGraph, RelationDirection};
use crate::domain::value_objects::{ContentNodeType, Identifier, PositionalData};

#[derive(Debug)]
pub enum GraphRepositoryError {
    NotFound(Identifier),
    DatabaseError(String),
    ValidationError(String),
    CorruptGraph(String),
}

impl std::fmt::Display for GraphRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphRepositoryError::NotFound(id) => write!(f, "Not found: {}", id),
            GraphRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            GraphRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            GraphRepositoryError::CorruptGraph(msg) => write!(f, "Stored graph is invalid: {}", msg),
        }
    }
}

impl std::error::Error for GraphRepositoryError {}

/// Row counts written by one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    pub components: usize,
    pub nodes: usize,
    pub relations: usize,
    /// Stale rows of the document that the new graph no longer contains.
    pub removed: usize,
}

#[async_trait]
pub trait GraphRepository: Send + Sync {
    /// Replaces the document's graph in one transaction: upserts by identifier and removes
    /// rows the new graph does not contain. Nothing is written if any statement fails.
    async fn commit(&self, graph: &DocumentGraph) -> Result<CommitSummary, GraphRepositoryError>;

    /// Loads the document's stored graph; an un-ingested document yields an empty graph.
    async fn load(&self, document_id: &Identifier) -> Result<DocumentGraph, GraphRepositoryError>;

    async fn find_node(&self, id: &Identifier) -> Result<Option<ContentNode>, GraphRepositoryError>;

    async fn find_component(
        &self,
        id: &Identifier,
    ) -> Result<Option<DocumentComponent>, GraphRepositoryError>;

    /// Nodes of one type in reading order.
    async fn nodes_by_type(
        &self,
        document_id: &Identifier,
        node_type: ContentNodeType,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError>;

    async fn nodes_on_page(
        &self,
        document_id: &Identifier,
        pdf_page: i32,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError>;

    async fn nodes_in_page_range(
        &self,
        document_id: &Identifier,
        start: i32,
        end: i32,
    ) -> Result<Vec<ContentNode>, GraphRepositoryError>;

    async fn relations_of(
        &self,
        node_id: &Identifier,
        direction: RelationDirection,
    ) -> Result<Vec<Relation>, GraphRepositoryError>;

    /// Writes new positional data for existing nodes; sequence columns are not touched.
    async fn update_positional_data(
        &self,
        updates: &[(Identifier, PositionalData)],
    ) -> Result<usize, GraphRepositoryError>;
}
