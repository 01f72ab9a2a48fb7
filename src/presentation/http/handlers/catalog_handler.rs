use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::use_cases::{
    GetPublicationUseCase, RecordDocumentStorageUseCase, RegisterPublicationUseCase,
    get_publication::GetPublicationError,
    record_document_storage::{RecordStorageError, RecordStorageRequest},
    register_publication::{RegisterPublicationError, RegisterPublicationRequest},
};
use crate::domain::value_objects::EntityKind;
use crate::presentation::http::dto::{
    ApiResponse, DocumentDto, ListPublicationsQuery, PublicationDto, PublicationListDto,
    RecordStorageRequestDto, RegisterPublicationRequestDto, RegisterPublicationResponseDto,
};
use crate::presentation::http::handlers::responses::{
    ErrorResponse, error_response, parse_identifier,
};

pub struct CatalogHandler {
    register_publication_use_case: Arc<RegisterPublicationUseCase>,
    get_publication_use_case: Arc<GetPublicationUseCase>,
    record_storage_use_case: Arc<RecordDocumentStorageUseCase>,
}

impl CatalogHandler {
    pub fn new(
        register_publication_use_case: Arc<RegisterPublicationUseCase>,
        get_publication_use_case: Arc<GetPublicationUseCase>,
        record_storage_use_case: Arc<RecordDocumentStorageUseCase>,
    ) -> Self {
        Self {
            register_publication_use_case,
            get_publication_use_case,
            record_storage_use_case,
        }
    }

    pub async fn register_publication(
        State(handler): State<Arc<CatalogHandler>>,
        Json(request): Json<RegisterPublicationRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = match RegisterPublicationRequest::try_from(request) {
            Ok(request) => request,
            Err(message) => {
                return Ok(error_response(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    message,
                ));
            }
        };

        match handler.register_publication_use_case.execute(request).await {
            Ok(response) => {
                let dto = RegisterPublicationResponseDto::from(response);
                Ok((StatusCode::CREATED, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let (status, code) = match &e {
                    RegisterPublicationError::ValidationError(_) => {
                        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                    }
                    RegisterPublicationError::IdentifierError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "IDENTIFIER_ERROR")
                    }
                    RegisterPublicationError::RepositoryError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "REGISTRATION_FAILED")
                    }
                };
                Ok(error_response(status, code, e.to_string()))
            }
        }
    }

    pub async fn list_publications(
        State(handler): State<Arc<CatalogHandler>>,
        Query(params): Query<ListPublicationsQuery>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let skip = params.skip.unwrap_or(0);
        let limit = params.limit.unwrap_or(100);

        match handler.get_publication_use_case.list(skip, limit).await {
            Ok(response) => {
                let dto = PublicationListDto::from(response);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let status = match &e {
                    GetPublicationError::ValidationError(_) => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                Ok(error_response(status, "LIST_FAILED", e.to_string()))
            }
        }
    }

    pub async fn get_publication(
        State(handler): State<Arc<CatalogHandler>>,
        Path(publication_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let publication_id = match parse_identifier(&publication_id, EntityKind::Publication) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler.get_publication_use_case.execute(&publication_id).await {
            Ok(publication) => {
                let dto = PublicationDto::from(&publication);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => Ok(publication_error(e)),
        }
    }

    pub async fn get_publication_documents(
        State(handler): State<Arc<CatalogHandler>>,
        Path(publication_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let publication_id = match parse_identifier(&publication_id, EntityKind::Publication) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        match handler
            .get_publication_use_case
            .documents(&publication_id)
            .await
        {
            Ok(documents) => {
                let dtos: Vec<DocumentDto> = documents.iter().map(DocumentDto::from).collect();
                Ok((StatusCode::OK, Json(ApiResponse::success(dtos))))
            }
            Err(e) => Ok(publication_error(e)),
        }
    }

    pub async fn record_storage(
        State(handler): State<Arc<CatalogHandler>>,
        Path(document_id): Path<String>,
        Json(request): Json<RecordStorageRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let document_id = match parse_identifier(&document_id, EntityKind::Document) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        let request = RecordStorageRequest {
            document_id,
            storage_url: request.storage_url,
            file_size: request.file_size,
        };

        match handler.record_storage_use_case.execute(request).await {
            Ok(document) => {
                let dto = DocumentDto::from(&document);
                Ok((StatusCode::OK, Json(ApiResponse::success(dto))))
            }
            Err(e) => {
                let (status, code) = match &e {
                    RecordStorageError::DocumentNotFound(_) => {
                        (StatusCode::NOT_FOUND, "DOCUMENT_NOT_FOUND")
                    }
                    RecordStorageError::ValidationError(_) => {
                        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
                    }
                    RecordStorageError::RepositoryError(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_UPDATE_FAILED")
                    }
                };
                Ok(error_response(status, code, e.to_string()))
            }
        }
    }
}

fn publication_error<T>(error: GetPublicationError) -> ErrorResponse<T> {
    let (status, code) = match &error {
        GetPublicationError::PublicationNotFound(_) => {
            (StatusCode::NOT_FOUND, "PUBLICATION_NOT_FOUND")
        }
        GetPublicationError::ValidationError(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        GetPublicationError::RepositoryError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "FETCH_FAILED")
        }
    };
    error_response(status, code, error.to_string())
}
