use pgvector::Vector;
use std::sync::Arc;

use crate::application::services::EmbeddingService;
use crate::domain::entities::{ContentNode, Embedding, EmbeddingTextError, Relation};
use crate::domain::graph::{AssemblyError, HeadingFormat, RelationDirection};
use crate::domain::repositories::embedding_repository::{
    SimilarityFilter, SimilaritySearchResult,
};
use crate::domain::repositories::graph_repository::GraphRepositoryError;
use crate::domain::repositories::{EmbeddingRepository, GraphRepository};
use crate::domain::value_objects::{ContentNodeType, Identifier, RelationType};

#[derive(Debug)]
pub enum QueryServiceError {
    NotFound(Identifier),
    NotAHeading(Identifier),
    MissingEmbeddingSource(EmbeddingTextError),
    InvalidRequest(String),
    RepositoryError(String),
    EmbeddingError(String),
}

impl std::fmt::Display for QueryServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryServiceError::NotFound(id) => write!(f, "Not found: {}", id),
            QueryServiceError::NotAHeading(id) => write!(f, "{} is not a heading node", id),
            QueryServiceError::MissingEmbeddingSource(err) => write!(f, "{}", err),
            QueryServiceError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            QueryServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            QueryServiceError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
        }
    }
}

impl std::error::Error for QueryServiceError {}

impl From<GraphRepositoryError> for QueryServiceError {
    fn from(error: GraphRepositoryError) -> Self {
        match error {
            GraphRepositoryError::NotFound(id) => QueryServiceError::NotFound(id),
            _ => QueryServiceError::RepositoryError(error.to_string()),
        }
    }
}

impl From<AssemblyError> for QueryServiceError {
    fn from(error: AssemblyError) -> Self {
        match error {
            AssemblyError::UnknownComponent(id) | AssemblyError::UnknownNode(id) => {
                QueryServiceError::NotFound(id)
            }
            other => QueryServiceError::RepositoryError(other.to_string()),
        }
    }
}

/// What to search with: a precomputed vector or text embedded on the fly.
#[derive(Debug, Clone)]
pub enum SimilarityQuery {
    Vector(Vector),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct NodeEmbedding {
    pub embedding: Embedding,
    /// A newer row exists for the same node.
    pub superseded: bool,
}

/// Read-side contract over committed document graphs.
pub struct QueryService {
    graph_repository: Arc<dyn GraphRepository>,
    embedding_repository: Arc<dyn EmbeddingRepository>,
    embedding_service: Arc<EmbeddingService>,
}

impl QueryService {
    pub fn new(
        graph_repository: Arc<dyn GraphRepository>,
        embedding_repository: Arc<dyn EmbeddingRepository>,
        embedding_service: Arc<EmbeddingService>,
    ) -> Self {
        Self {
            graph_repository,
            embedding_repository,
            embedding_service,
        }
    }

    pub async fn filter_by_type(
        &self,
        document_id: &Identifier,
        node_type: ContentNodeType,
    ) -> Result<Vec<ContentNode>, QueryServiceError> {
        Ok(self
            .graph_repository
            .nodes_by_type(document_id, node_type)
            .await?)
    }

    pub async fn traverse_component(
        &self,
        component_id: &Identifier,
        include_supplementary: bool,
    ) -> Result<Vec<ContentNode>, QueryServiceError> {
        let component = self
            .graph_repository
            .find_component(component_id)
            .await?
            .ok_or_else(|| QueryServiceError::NotFound(component_id.clone()))?;

        let graph = self.graph_repository.load(component.document_id()).await?;
        Ok(graph
            .traverse(component_id, include_supplementary)?
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn relations(
        &self,
        node_id: &Identifier,
        direction: RelationDirection,
    ) -> Result<Vec<Relation>, QueryServiceError> {
        self.require_node(node_id).await?;
        Ok(self.graph_repository.relations_of(node_id, direction).await?)
    }

    /// Nodes at the far end of `node_id`'s relations; unresolved relations contribute nothing.
    pub async fn resolve_relation(
        &self,
        node_id: &Identifier,
        relation_type: Option<RelationType>,
        direction: RelationDirection,
    ) -> Result<Vec<ContentNode>, QueryServiceError> {
        let relations = self.relations(node_id, direction).await?;

        let mut related = Vec::new();
        for relation in relations
            .iter()
            .filter(|r| relation_type.is_none_or(|t| r.relation_type() == t))
        {
            let other = match direction {
                RelationDirection::SourceOf => relation.target_node_id(),
                RelationDirection::TargetOf => Some(relation.source_node_id()),
            };
            if let Some(other) = other {
                if let Some(node) = self.graph_repository.find_node(other).await? {
                    related.push(node);
                }
            }
        }
        Ok(related)
    }

    pub async fn embedding_source_text(
        &self,
        node_id: &Identifier,
    ) -> Result<String, QueryServiceError> {
        let node = self.require_node(node_id).await?;
        node.embedding_source_text()
            .map(str::to_string)
            .map_err(QueryServiceError::MissingEmbeddingSource)
    }

    pub async fn render_heading(
        &self,
        node_id: &Identifier,
        format: HeadingFormat,
    ) -> Result<String, QueryServiceError> {
        let node = self.require_node(node_id).await?;
        if node.node_type() != ContentNodeType::Heading {
            return Err(QueryServiceError::NotAHeading(node_id.clone()));
        }

        let graph = self.graph_repository.load(node.document_id()).await?;
        graph
            .render_heading(node_id, format)
            .ok_or_else(|| QueryServiceError::NotFound(node_id.clone()))
    }

    pub async fn nodes_on_page(
        &self,
        document_id: &Identifier,
        pdf_page: i32,
    ) -> Result<Vec<ContentNode>, QueryServiceError> {
        if pdf_page < 1 {
            return Err(QueryServiceError::InvalidRequest(format!(
                "Page numbers start at 1, got {}",
                pdf_page
            )));
        }
        Ok(self
            .graph_repository
            .nodes_on_page(document_id, pdf_page)
            .await?)
    }

    pub async fn nodes_in_page_range(
        &self,
        document_id: &Identifier,
        start: i32,
        end: i32,
    ) -> Result<Vec<ContentNode>, QueryServiceError> {
        if start < 1 || end < start {
            return Err(QueryServiceError::InvalidRequest(format!(
                "Invalid page range {}..{}",
                start, end
            )));
        }
        Ok(self
            .graph_repository
            .nodes_in_page_range(document_id, start, end)
            .await?)
    }

    /// Vector search over each node's current embedding, restricted to one node type
    /// before ranking. Without an explicit model the configured provider's model is used.
    pub async fn similar_nodes(
        &self,
        query: SimilarityQuery,
        mut filter: SimilarityFilter,
        limit: i64,
    ) -> Result<Vec<SimilaritySearchResult>, QueryServiceError> {
        if !(1..=100).contains(&limit) {
            return Err(QueryServiceError::InvalidRequest(
                "Limit must be between 1 and 100".to_string(),
            ));
        }

        let vector = match query {
            SimilarityQuery::Vector(vector) => {
                let expected = self.embedding_service.embedding_dimension();
                if vector.as_slice().len() != expected {
                    return Err(QueryServiceError::InvalidRequest(format!(
                        "Query vector has {} dimensions, expected {}",
                        vector.as_slice().len(),
                        expected
                    )));
                }
                vector
            }
            SimilarityQuery::Text(text) => self
                .embedding_service
                .embed_query(&text)
                .await
                .map_err(|e| QueryServiceError::EmbeddingError(e.to_string()))?,
        };

        if filter.model_name.is_none() {
            filter.model_name = Some(self.embedding_service.model_name().to_string());
        }

        self.embedding_repository
            .similarity_search(&vector, &filter, limit)
            .await
            .map_err(|e| QueryServiceError::RepositoryError(e.to_string()))
    }

    pub async fn node_embeddings(
        &self,
        node_id: &Identifier,
    ) -> Result<Vec<NodeEmbedding>, QueryServiceError> {
        self.require_node(node_id).await?;
        let embeddings = self
            .embedding_repository
            .find_by_node(node_id)
            .await
            .map_err(|e| QueryServiceError::RepositoryError(e.to_string()))?;

        Ok(embeddings
            .iter()
            .map(|embedding| NodeEmbedding {
                embedding: embedding.clone(),
                superseded: embeddings.iter().any(|other| other.supersedes(embedding)),
            })
            .collect())
    }

    async fn require_node(&self, node_id: &Identifier) -> Result<ContentNode, QueryServiceError> {
        self.graph_repository
            .find_node(node_id)
            .await?
            .ok_or_else(|| QueryServiceError::NotFound(node_id.clone()))
    }
}
