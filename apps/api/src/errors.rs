use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::resume::service::UpdateError;
use crate::resume::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The planner failed or timed out. Nothing was stored; the client may retry.
    #[error("Planner unavailable: {0}")]
    PlannerUnavailable(String),

    /// The merge succeeded but could not be saved. `unsaved` is the computed result.
    #[error("Persistence failed: {message}")]
    PersistenceFailed { message: String, unsaved: Value },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => AppError::Database(e),
            StoreError::StaleVersion { resume_id, .. } => AppError::Conflict(format!(
                "Resume {resume_id} was changed by another update; retry"
            )),
            StoreError::Serialize(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<UpdateError> for AppError {
    fn from(err: UpdateError) -> Self {
        match err {
            UpdateError::NotFound(id) => AppError::NotFound(format!("Resume {id} not found")),
            UpdateError::PreconditionFailed(_) => {
                AppError::PreconditionFailed(NO_PARSED_DATA.to_string())
            }
            UpdateError::Fetch(e) => e.into(),
            e @ UpdateError::Conflict(_) => AppError::Conflict(e.to_string()),
            e @ (UpdateError::Planner(_) | UpdateError::PlannerTimeout(_)) => {
                AppError::PlannerUnavailable(e.to_string())
            }
            UpdateError::Persistence { source, outcome } => AppError::PersistenceFailed {
                message: source.to_string(),
                unsaved: serde_json::to_value(&*outcome).unwrap_or(Value::Null),
            },
            e @ UpdateError::CorruptRecord { .. } => AppError::Internal(e.into()),
        }
    }
}

/// Shown when a resume has no structured data to work on.
pub const NO_PARSED_DATA: &str =
    "Resume has no parsed data. Parse the resume before updating or analyzing it.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut unsaved_result = None;
        let (status, code, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg),
            AppError::PreconditionFailed(msg) => {
                (StatusCode::PRECONDITION_FAILED, "PRECONDITION_FAILED", msg)
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            AppError::PlannerUnavailable(msg) => {
                tracing::warn!("Planner unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PLANNER_ERROR",
                    "The update could not be planned and nothing was changed. Try again shortly."
                        .to_string(),
                )
            }
            AppError::PersistenceFailed { message, unsaved } => {
                tracing::error!("Failed to store merged resume: {message}");
                unsaved_result = Some(unsaved);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PERSISTENCE_ERROR",
                    "The update was computed but could not be saved".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": code,
                "message": message
            }
        });
        if let Some(unsaved) = unsaved_result {
            body["unsaved_result"] = unsaved;
        }

        (status, Json(body)).into_response()
    }
}
