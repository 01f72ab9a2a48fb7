use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use std::time::Instant;

use crate::application::services::QueryService;
use crate::application::use_cases::{
    EmbedDocumentUseCase,
    embed_document::{EmbedDocumentError, EmbedDocumentRequest},
};
use crate::domain::repositories::embedding_repository::SimilarityFilter;
use crate::domain::value_objects::{ContentNodeType, EntityKind};
use crate::presentation::http::dto::{
    ApiResponse, EmbedDocumentRequestDto, EmbeddingReportDto, NodeEmbeddingDto, SearchRequestDto,
    SearchResponseDto, SearchResultDto,
};
use crate::presentation::http::handlers::responses::{
    error_response, parse_identifier, query_error,
};

pub struct SearchHandler {
    query_service: Arc<QueryService>,
    embed_document_use_case: Arc<EmbedDocumentUseCase>,
}

impl SearchHandler {
    pub fn new(
        query_service: Arc<QueryService>,
        embed_document_use_case: Arc<EmbedDocumentUseCase>,
    ) -> Self {
        Self {
            query_service,
            embed_document_use_case,
        }
    }

    pub async fn search(
        State(handler): State<Arc<SearchHandler>>,
        Json(request): Json<SearchRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let query = match request.similarity_query() {
            Ok(query) => query,
            Err(message) => {
                return Ok(error_response(StatusCode::BAD_REQUEST, "EMPTY_QUERY", message));
            }
        };
        let node_type = match request.node_type.as_deref().map(str::parse::<ContentNodeType>) {
            None => None,
            Some(Ok(node_type)) => Some(node_type),
            Some(Err(message)) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_NODE_TYPE",
                    message,
                ));
            }
        };
        let document_id = match request.document_id.as_deref() {
            None => None,
            Some(raw) => match parse_identifier(raw, EntityKind::Document) {
                Ok(id) => Some(id),
                Err(response) => return Ok(response),
            },
        };

        let filter = SimilarityFilter {
            node_type,
            document_id,
            model_name: None,
            similarity_threshold: request.similarity_threshold,
        };

        let started = Instant::now();
        match handler
            .query_service
            .similar_nodes(query, filter, request.limit)
            .await
        {
            Ok(results) => {
                let results: Vec<SearchResultDto> =
                    results.into_iter().map(SearchResultDto::from).collect();
                let dto = SearchResponseDto {
                    total_results: results.len(),
                    results,
                    search_time_ms: started.elapsed().as_millis() as u64,
                };
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(query_error(e)),
        }
    }

    // Embed a document's nodes, optionally restricted to some node types
    pub async fn embed_document(
        State(handler): State<Arc<SearchHandler>>,
        Path(document_id): Path<String>,
        body: Bytes,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        let body = if body.is_empty() {
            EmbedDocumentRequestDto::default()
        } else {
            match serde_json::from_slice::<EmbedDocumentRequestDto>(&body) {
                Ok(body) => body,
                Err(e) => {
                    return Ok(error_response(
                        StatusCode::BAD_REQUEST,
                        "INVALID_REQUEST",
                        e.to_string(),
                    ));
                }
            }
        };
        let node_types = match body
            .node_types
            .iter()
            .map(|t| t.parse::<ContentNodeType>())
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(node_types) => node_types,
            Err(message) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_NODE_TYPE",
                    message,
                ));
            }
        };

        let request = EmbedDocumentRequest {
            document_id: document_id.clone(),
            node_types,
        };

        match handler.embed_document_use_case.execute(request).await {
            Ok(report) => {
                let dto = EmbeddingReportDto::new(document_id.to_string(), report);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let (status, code) = match &e {
                    EmbedDocumentError::NotIngested(_) => (StatusCode::NOT_FOUND, "NOT_INGESTED"),
                    EmbedDocumentError::RepositoryError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
                    }
                    EmbedDocumentError::EmbeddingError(_) => {
                        (StatusCode::BAD_GATEWAY, "EMBEDDING_ERROR")
                    }
                };
                Ok(error_response(status, code, e.to_string()))
            }
        }
    }

    pub async fn node_embeddings(
        State(handler): State<Arc<SearchHandler>>,
        Path(node_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let node_id = match parse_identifier(&node_id, EntityKind::Node) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler.query_service.node_embeddings(&node_id).await {
            Ok(entries) => {
                let dtos: Vec<NodeEmbeddingDto> =
                    entries.into_iter().map(NodeEmbeddingDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok(query_error(e)),
        }
    }
}
