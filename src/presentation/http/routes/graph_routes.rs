use axum::{Router, routing::get, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::GraphHandler;

pub fn graph_routes(graph_handler: Arc<GraphHandler>) -> Router {
    Router::new()
        .route(
            "/documents/{document_id}/nodes",
            get(GraphHandler::nodes_by_type),
        )
        .route(
            "/documents/{document_id}/pages",
            get(GraphHandler::nodes_in_page_range),
        )
        .route(
            "/documents/{document_id}/pages/{page}",
            get(GraphHandler::nodes_on_page),
        )
        .route(
            "/documents/{document_id}/logical-pages",
            post(GraphHandler::enrich_logical_pages),
        )
        .route(
            "/components/{component_id}/nodes",
            get(GraphHandler::traverse_component),
        )
        .route("/nodes/{node_id}/related", get(GraphHandler::related_nodes))
        .route(
            "/nodes/{node_id}/embedding-text",
            get(GraphHandler::embedding_text),
        )
        .route("/nodes/{node_id}/heading", get(GraphHandler::heading))
        .with_state(graph_handler)
}
