use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::application::services::EmbeddingService;
use crate::infrastructure::container::AppContainer;
use crate::infrastructure::messaging::IngestionWorkerPool;
use crate::presentation::http::{
    handlers::{CatalogHandler, GraphHandler, JobHandler, SearchHandler},
    routes::{catalog_routes, graph_routes, health_routes, job_routes, search_routes},
};

/// Fragment streams for long documents can be large; anything above this is rejected.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub struct HttpServer {
    catalog_handler: Arc<CatalogHandler>,
    job_handler: Arc<JobHandler>,
    graph_handler: Arc<GraphHandler>,
    search_handler: Arc<SearchHandler>,
    embedding_service: Arc<EmbeddingService>,
    worker_pool: Arc<IngestionWorkerPool>,
    port: u16,
}

impl HttpServer {
    pub fn new(container: &AppContainer, port: Option<u16>) -> Self {
        Self {
            catalog_handler: container.catalog_handler.clone(),
            job_handler: container.job_handler.clone(),
            graph_handler: container.graph_handler.clone(),
            search_handler: container.search_handler.clone(),
            embedding_service: container.embedding_service.clone(),
            worker_pool: container.worker_pool.clone(),
            port: port.unwrap_or(3000),
        }
    }

    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .merge(health_routes(self.embedding_service.clone()))
            .merge(catalog_routes(self.catalog_handler.clone()))
            .merge(job_routes(self.job_handler.clone()))
            .merge(graph_routes(self.graph_handler.clone()))
            .merge(search_routes(self.search_handler.clone()))
            .layer(cors)
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            )
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        // Start ingestion workers
        let workers = self.worker_pool.start();
        tracing::info!("Started {} ingestion workers", workers.len());

        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        tracing::info!("Listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}
