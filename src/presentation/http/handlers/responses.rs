use axum::{Json, http::StatusCode};

use crate::application::services::query_service::QueryServiceError;
use crate::domain::value_objects::{EntityKind, Identifier};
use crate::presentation::http::dto::ApiResponse;

pub type ErrorResponse<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn error_response<T>(status: StatusCode, code: &str, message: String) -> ErrorResponse<T> {
    (
        status,
        Json(ApiResponse::error(code.to_string(), message, None)),
    )
}

/// Path identifiers must be well formed and of the kind the route names.
pub fn parse_identifier<T>(raw: &str, kind: EntityKind) -> Result<Identifier, ErrorResponse<T>> {
    Identifier::parse_kind(raw, kind).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, "INVALID_IDENTIFIER", e.to_string())
    })
}

pub fn query_error<T>(error: QueryServiceError) -> ErrorResponse<T> {
    let (status, code) = match &error {
        QueryServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        QueryServiceError::NotAHeading(_) => (StatusCode::UNPROCESSABLE_ENTITY, "NOT_A_HEADING"),
        QueryServiceError::MissingEmbeddingSource(_) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "MISSING_EMBEDDING_SOURCE",
        ),
        QueryServiceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        QueryServiceError::RepositoryError(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "REPOSITORY_ERROR")
        }
        QueryServiceError::EmbeddingError(_) => (StatusCode::BAD_GATEWAY, "EMBEDDING_ERROR"),
    };
    error_response(status, code, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier_checks_kind() {
        assert!(parse_identifier::<()>("doc_003", EntityKind::Document).is_ok());

        let (status, _) = parse_identifier::<()>("pub_003", EntityKind::Document).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_query_error_status_codes() {
        let id = Identifier::parse("node_001_0002").unwrap();

        let (status, _) = query_error::<()>(QueryServiceError::NotFound(id.clone()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = query_error::<()>(QueryServiceError::NotAHeading(id));
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, Json(body)) =
            query_error::<()>(QueryServiceError::InvalidRequest("limit".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error.unwrap().code, "INVALID_REQUEST");
    }
}
