use axum::{Router, routing::get, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::SearchHandler;

pub fn search_routes(search_handler: Arc<SearchHandler>) -> Router {
    Router::new()
        .route("/search", post(SearchHandler::search))
        .route(
            "/documents/{document_id}/embeddings",
            post(SearchHandler::embed_document),
        )
        .route(
            "/nodes/{node_id}/embeddings",
            get(SearchHandler::node_embeddings),
        )
        .with_state(search_handler)
}
