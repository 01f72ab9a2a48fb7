use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use std::sync::Arc;

use crate::application::services::EmbeddingService;
use crate::presentation::http::dto::{ApiResponse, HealthResponseDto};

pub fn health_routes(embedding_service: Arc<EmbeddingService>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(embedding_service)
}

async fn root_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ApiResponse::success("docgraph".to_string())),
    )
}

// The service stays up when the embedding endpoint is down; only search and embedding degrade.
async fn health_handler(State(embedding_service): State<Arc<EmbeddingService>>) -> impl IntoResponse {
    let embeddings = match embedding_service.health_check().await {
        Ok(true) => "up",
        Ok(false) => "down",
        Err(e) => {
            tracing::warn!("Embedding service health check failed: {}", e);
            "down"
        }
    };

    let health_response = HealthResponseDto {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        embedding_model: embedding_service.model_name().to_string(),
        embedding_service: embeddings.to_string(),
    };

    (StatusCode::OK, Json(ApiResponse::success(health_response)))
}
