use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};

use crate::application::services::embedding_service::EmbeddingBatchReport;
use crate::application::services::query_service::{NodeEmbedding, SimilarityQuery};
use crate::domain::repositories::embedding_repository::SimilaritySearchResult;
use crate::presentation::http::dto::ContentNodeDto;

/// Either `query` text (embedded server-side) or a precomputed `vector` is required.
#[derive(Debug, Deserialize)]
pub struct SearchRequestDto {
    pub query: Option<String>,
    pub vector: Option<Vec<f32>>,
    pub node_type: Option<String>,
    pub document_id: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub similarity_threshold: Option<f32>,
}

fn default_limit() -> i64 {
    10
}

impl SearchRequestDto {
    pub fn similarity_query(&self) -> Result<SimilarityQuery, String> {
        match (&self.vector, &self.query) {
            (Some(vector), _) => Ok(SimilarityQuery::Vector(Vector::from(vector.clone()))),
            (None, Some(text)) if !text.trim().is_empty() => {
                Ok(SimilarityQuery::Text(text.trim().to_string()))
            }
            _ => Err("Either a non-empty query or a vector is required".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResultDto {
    pub node: ContentNodeDto,
    pub embedding_id: String,
    pub model_name: String,
    pub similarity_score: f32,
}

impl From<SimilaritySearchResult> for SearchResultDto {
    fn from(result: SimilaritySearchResult) -> Self {
        Self {
            node: ContentNodeDto::from(&result.node),
            embedding_id: result.embedding.id().to_string(),
            model_name: result.embedding.model_name().to_string(),
            similarity_score: result.similarity_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponseDto {
    pub results: Vec<SearchResultDto>,
    pub total_results: usize,
    pub search_time_ms: u64,
}

#[derive(Debug, Deserialize, Default)]
pub struct EmbedDocumentRequestDto {
    #[serde(default)]
    pub node_types: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbeddingReportDto {
    pub document_id: String,
    pub embedded: usize,
    pub stored: usize,
    pub skipped: Vec<String>,
}

impl EmbeddingReportDto {
    pub fn new(document_id: String, report: EmbeddingBatchReport) -> Self {
        Self {
            document_id,
            embedded: report.embedded,
            stored: report.stored,
            skipped: report.skipped.iter().map(|id| id.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NodeEmbeddingDto {
    pub embedding_id: String,
    pub node_id: String,
    pub model_name: String,
    pub dimension: usize,
    pub created_at: DateTime<Utc>,
    pub superseded: bool,
}

impl From<NodeEmbedding> for NodeEmbeddingDto {
    fn from(entry: NodeEmbedding) -> Self {
        let embedding = entry.embedding;
        Self {
            embedding_id: embedding.id().to_string(),
            node_id: embedding.node_id().to_string(),
            model_name: embedding.model_name().to_string(),
            dimension: embedding.dimension(),
            created_at: embedding.created_at(),
            superseded: entry.superseded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_prefers_vector() {
        let dto: SearchRequestDto = serde_json::from_value(serde_json::json!({
            "query": "ignored",
            "vector": [0.1, 0.2],
            "node_type": "paragraph"
        }))
        .unwrap();

        assert_eq!(dto.limit, 10);
        assert!(matches!(dto.similarity_query(), Ok(SimilarityQuery::Vector(_))));
    }

    #[test]
    fn test_search_request_needs_query_or_vector() {
        let dto: SearchRequestDto = serde_json::from_value(serde_json::json!({ "query": "  " })).unwrap();
        assert!(dto.similarity_query().is_err());

        let dto: SearchRequestDto =
            serde_json::from_value(serde_json::json!({ "query": "enclosure acts" })).unwrap();
        match dto.similarity_query() {
            Ok(SimilarityQuery::Text(text)) => assert_eq!(text, "enclosure acts"),
            other => panic!("unexpected query: {:?}", other),
        }
    }
}
