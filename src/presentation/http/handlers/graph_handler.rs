use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::services::QueryService;
use crate::application::use_cases::{
    EnrichLogicalPagesUseCase, enrich_logical_pages::EnrichLogicalPagesError,
};
use crate::domain::graph::{HeadingFormat, RelationDirection};
use crate::domain::value_objects::{ContentNodeType, EntityKind, LogicalPageMap, RelationType};
use crate::presentation::http::dto::{
    ApiResponse, HeadingQuery, LogicalPagesRequestDto, LogicalPagesResponseDto, NodeTypeQuery,
    PageRangeQuery, RelatedNodesQuery, TextResponseDto, TraverseQuery, node_dtos,
};
use crate::presentation::http::handlers::responses::{
    error_response, parse_identifier, query_error,
};

/// Read side of committed graphs plus the logical-page post-pass.
pub struct GraphHandler {
    query_service: Arc<QueryService>,
    enrich_logical_pages_use_case: Arc<EnrichLogicalPagesUseCase>,
}

impl GraphHandler {
    pub fn new(
        query_service: Arc<QueryService>,
        enrich_logical_pages_use_case: Arc<EnrichLogicalPagesUseCase>,
    ) -> Self {
        Self {
            query_service,
            enrich_logical_pages_use_case,
        }
    }

    pub async fn nodes_by_type(
        State(handler): State<Arc<GraphHandler>>,
        Path(document_id): Path<String>,
        Query(params): Query<NodeTypeQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };
        let node_type = match params.node_type.parse::<ContentNodeType>() {
            Ok(node_type) => node_type,
            Err(message) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_NODE_TYPE",
                    message,
                ));
            }
        };

        match handler
            .query_service
            .filter_by_type(&document_id, node_type)
            .await
        {
            Ok(nodes) => Ok((StatusCode::OK, Json(ApiResponse::success(node_dtos(&nodes))))),
            Err(e) => Ok(query_error(e)),
        }
    }

    pub async fn nodes_on_page(
        State(handler): State<Arc<GraphHandler>>,
        Path((document_id, pdf_page)): Path<(String, i32)>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler
            .query_service
            .nodes_on_page(&document_id, pdf_page)
            .await
        {
            Ok(nodes) => Ok((StatusCode::OK, Json(ApiResponse::success(node_dtos(&nodes))))),
            Err(e) => Ok(query_error(e)),
        }
    }

    pub async fn nodes_in_page_range(
        State(handler): State<Arc<GraphHandler>>,
        Path(document_id): Path<String>,
        Query(range): Query<PageRangeQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler
            .query_service
            .nodes_in_page_range(&document_id, range.start, range.end)
            .await
        {
            Ok(nodes) => Ok((StatusCode::OK, Json(ApiResponse::success(node_dtos(&nodes))))),
            Err(e) => Ok(query_error(e)),
        }
    }

    pub async fn traverse_component(
        State(handler): State<Arc<GraphHandler>>,
        Path(component_id): Path<String>,
        Query(params): Query<TraverseQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let component_id = match parse_identifier(&component_id, EntityKind::Component) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler
            .query_service
            .traverse_component(&component_id, params.include_supplementary)
            .await
        {
            Ok(nodes) => Ok((StatusCode::OK, Json(ApiResponse::success(node_dtos(&nodes))))),
            Err(e) => Ok(query_error(e)),
        }
    }

    pub async fn related_nodes(
        State(handler): State<Arc<GraphHandler>>,
        Path(node_id): Path<String>,
        Query(params): Query<RelatedNodesQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let node_id = match parse_identifier(&node_id, EntityKind::Node) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };
        let relation_type = match params.relation_type.as_deref().map(str::parse::<RelationType>) {
            None => None,
            Some(Ok(relation_type)) => Some(relation_type),
            Some(Err(message)) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_RELATION_TYPE",
                    message,
                ));
            }
        };
        let direction = match params.direction.as_deref().map(str::parse::<RelationDirection>) {
            None => RelationDirection::SourceOf,
            Some(Ok(direction)) => direction,
            Some(Err(message)) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "INVALID_DIRECTION",
                    message,
                ));
            }
        };

        match handler
            .query_service
            .resolve_relation(&node_id, relation_type, direction)
            .await
        {
            Ok(nodes) => Ok((StatusCode::OK, Json(ApiResponse::success(node_dtos(&nodes))))),
            Err(e) => Ok(query_error(e)),
        }
    }

    pub async fn embedding_text(
        State(handler): State<Arc<GraphHandler>>,
        Path(node_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let node_id = match parse_identifier(&node_id, EntityKind::Node) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler.query_service.embedding_source_text(&node_id).await {
            Ok(text) => {
                let dto = TextResponseDto {
                    node_id: node_id.to_string(),
                    text,
                };
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(query_error(e)),
        }
    }

    pub async fn heading(
        State(handler): State<Arc<GraphHandler>>,
        Path(node_id): Path<String>,
        Query(params): Query<HeadingQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let node_id = match parse_identifier(&node_id, EntityKind::Node) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };
        let format = if params.markdown {
            HeadingFormat::Markdown
        } else {
            HeadingFormat::Plain
        };

        match handler.query_service.render_heading(&node_id, format).await {
            Ok(text) => {
                let dto = TextResponseDto {
                    node_id: node_id.to_string(),
                    text,
                };
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(query_error(e)),
        }
    }

    pub async fn enrich_logical_pages(
        State(handler): State<Arc<GraphHandler>>,
        Path(document_id): Path<String>,
        Json(request): Json<LogicalPagesRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };
        let labels = LogicalPageMap::from(request);

        match handler
            .enrich_logical_pages_use_case
            .execute(&document_id, &labels)
            .await
        {
            Ok(response) => {
                let dto = LogicalPagesResponseDto::new(document_id.to_string(), response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let (status, code) = match &e {
                    EnrichLogicalPagesError::NotIngested(_) => {
                        (StatusCode::NOT_FOUND, "NOT_INGESTED")
                    }
                    EnrichLogicalPagesError::ValidationError(_) => {
                        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                    }
                    EnrichLogicalPagesError::RepositoryError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "ENRICHMENT_FAILED")
                    }
                };
                Ok(error_response(status, code, e.to_string()))
            }
        }
    }
}
