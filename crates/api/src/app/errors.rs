use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use certportal_core::WorkflowError;

/// Map engine errors to HTTP responses.
///
/// Preconditions keep their structured detail (e.g. the exact missing
/// document types) so clients can act on them without parsing messages.
pub fn workflow_error_to_response(err: WorkflowError) -> axum::response::Response {
    match err {
        WorkflowError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        WorkflowError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        WorkflowError::IllegalTransition { .. } => {
            json_error(StatusCode::CONFLICT, "illegal_transition", err.to_string())
        }
        WorkflowError::Precondition(precondition) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({
                "error": "precondition_failed",
                "message": precondition.to_string(),
                "detail": precondition,
            })),
        )
            .into_response(),
        WorkflowError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden"),
        WorkflowError::CodeGenerationExhausted { .. } => {
            tracing::error!(error = %err, "code generation exhausted");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "code_generation_exhausted",
                "could not allocate a unique code",
            )
        }
        WorkflowError::Storage(detail) => {
            tracing::error!(%detail, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "internal storage failure",
            )
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
