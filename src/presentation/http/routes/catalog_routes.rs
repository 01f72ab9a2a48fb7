use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::presentation::http::handlers::CatalogHandler;

pub fn catalog_routes(catalog_handler: Arc<CatalogHandler>) -> Router {
    Router::new()
        .route(
            "/publications",
            post(CatalogHandler::register_publication).get(CatalogHandler::list_publications),
        )
        .route("/publications/{publication_id}", get(CatalogHandler::get_publication))
        .route(
            "/publications/{publication_id}/documents",
            get(CatalogHandler::get_publication_documents),
        )
        .route(
            "/documents/{document_id}/storage",
            put(CatalogHandler::record_storage),
        )
        .with_state(catalog_handler)
}
