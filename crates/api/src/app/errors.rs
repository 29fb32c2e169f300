use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockbook_core::DomainError;

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::DuplicateKey(msg) => json_error(StatusCode::CONFLICT, "duplicate_key", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::InvalidMovement(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_movement", msg)
        }
        DomainError::ConstraintViolation(msg) => {
            json_error(StatusCode::BAD_REQUEST, "constraint_violation", msg)
        }
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
