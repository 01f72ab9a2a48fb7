use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::use_cases::{
    GetJobStatusUseCase, IngestPublicationUseCase, QueueIngestionUseCase,
    ingest_publication::IngestPublicationError,
    queue_ingestion::{QueueIngestionError, QueueIngestionRequest},
};
use crate::domain::value_objects::EntityKind;
use crate::presentation::http::dto::{
    ApiResponse, JobStatusDto, PublicationIngestionDto, QueueIngestionRequestDto,
};
use crate::presentation::http::handlers::responses::{error_response, parse_identifier};

pub struct JobHandler {
    queue_ingestion_use_case: Arc<QueueIngestionUseCase>,
    ingest_publication_use_case: Arc<IngestPublicationUseCase>,
    get_job_status_use_case: Arc<GetJobStatusUseCase>,
}

impl JobHandler {
    pub fn new(
        queue_ingestion_use_case: Arc<QueueIngestionUseCase>,
        ingest_publication_use_case: Arc<IngestPublicationUseCase>,
        get_job_status_use_case: Arc<GetJobStatusUseCase>,
    ) -> Self {
        Self {
            queue_ingestion_use_case,
            ingest_publication_use_case,
            get_job_status_use_case,
        }
    }

    // Queue ingestion of one document; the body may carry a replacement fragment stream
    pub async fn queue_document_ingestion(
        State(handler): State<Arc<JobHandler>>,
        Path(document_id): Path<String>,
        body: Bytes,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        let body = if body.is_empty() {
            QueueIngestionRequestDto::default()
        } else {
            match serde_json::from_slice::<QueueIngestionRequestDto>(&body) {
                Ok(body) => body,
                Err(e) => {
                    return Ok(error_response(
                        StatusCode::BAD_REQUEST,
                        "INVALID_FRAGMENTS",
                        e.to_string(),
                    ));
                }
            }
        };

        let request = QueueIngestionRequest {
            document_id,
            fragments: body.fragments,
        };

        match handler.queue_ingestion_use_case.execute(request).await {
            Ok(job) => {
                let dto = JobStatusDto::from_job(job);
                Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let (status, code) = match &e {
                    QueueIngestionError::DocumentNotFound(_) => {
                        (StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND")
                    }
                    QueueIngestionError::FragmentsMissing(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "FRAGMENTS_MISSING")
                    }
                    QueueIngestionError::AlreadyQueued(_) => {
                        (StatusCode::CONFLICT, "ALREADY_QUEUED")
                    }
                    QueueIngestionError::RepositoryError(_) | QueueIngestionError::QueueError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "QUEUE_FAILED")
                    }
                };
                Ok(error_response(status, code, e.to_string()))
            }
        }
    }

    // Assemble every document of a publication now and report per document
    pub async fn ingest_publication(
        State(handler): State<Arc<JobHandler>>,
        Path(publication_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let publication_id = match parse_identifier(&publication_id, EntityKind::Publication) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler
            .ingest_publication_use_case
            .execute(&publication_id)
            .await
        {
            Ok(response) => {
                let dto = PublicationIngestionDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let (status, code) = match &e {
                    IngestPublicationError::PublicationNotFound(_) => {
                        (StatusCode::NOT_FOUND, "PUBLICATION_NOT_FOUND")
                    }
                    IngestPublicationError::RepositoryError(_)
                    | IngestPublicationError::IngestionError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "INGESTION_FAILED")
                    }
                };
                Ok(error_response(status, code, e.to_string()))
            }
        }
    }

    // Get job status
    pub async fn get_job_status(
        State(handler): State<Arc<JobHandler>>,
        Path(job_id): Path<Uuid>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_job_status_use_case.execute(job_id).await {
            Ok(response) => {
                let dto = JobStatusDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error(
                    "JOB_NOT_FOUND".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    // Get jobs for a specific document
    pub async fn get_document_jobs(
        State(handler): State<Arc<JobHandler>>,
        Path(document_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler
            .get_job_status_use_case
            .jobs_for_document(&document_id)
            .await
        {
            Ok(jobs) => {
                let dtos: Vec<JobStatusDto> =
                    jobs.into_iter().map(JobStatusDto::from_job).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "FETCH_FAILED",
                e.to_string(),
            )),
        }
    }

    // Get all active jobs
    pub async fn get_active_jobs(
        State(handler): State<Arc<JobHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.get_job_status_use_case.active_jobs().await {
            Ok(jobs) => {
                let dtos: Vec<JobStatusDto> =
                    jobs.into_iter().map(JobStatusDto::from_job).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "FETCH_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}
