use axum::{Router, routing::get, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::JobHandler;

pub fn job_routes(job_handler: Arc<JobHandler>) -> Router {
    Router::new()
        // Ingestion endpoints
        .route(
            "/documents/{document_id}/ingest",
            post(JobHandler::queue_document_ingestion),
        )
        .route(
            "/publications/{publication_id}/ingest",
            post(JobHandler::ingest_publication),
        )
        // Job status endpoints
        .route("/jobs/active", get(JobHandler::get_active_jobs))
        .route("/jobs/{job_id}", get(JobHandler::get_job_status))
        .route(
            "/documents/{document_id}/jobs",
            get(JobHandler::get_document_jobs),
        )
        .with_state(job_handler)
}
