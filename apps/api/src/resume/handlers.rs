use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::{AppError, NO_PARSED_DATA};
use crate::models::resume::{ResumeRow, ResumeSummaryRow, ResumeVersionRow};
use crate::resume::analysis::{analyze_resume, ResumeAnalysis};
use crate::resume::service::UpdateOutcome;
use crate::resume::store::{
    fetch_resume, get_version_history, insert_resume, list_resumes_for_user, save_analysis,
    NewResume,
};
use crate::resume::structured::StructuredResume;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct CreateResumeRequest {
    pub user_id: Uuid,
    pub filename: String,
    pub extracted_text: Option<String>,
    pub parsed_data: Option<StructuredResume>,
}

#[derive(Deserialize)]
pub struct SmartUpdateRequest {
    pub user_id: Uuid,
    pub update_text: String,
}

/// POST /api/v1/resumes
pub async fn handle_create_resume(
    State(state): State<AppState>,
    Json(req): Json<CreateResumeRequest>,
) -> Result<(StatusCode, Json<ResumeRow>), AppError> {
    if req.filename.trim().is_empty() {
        return Err(AppError::Validation("filename must not be empty".to_string()));
    }

    let row = insert_resume(
        &state.db,
        NewResume {
            user_id: req.user_id,
            filename: req.filename.trim(),
            extracted_text: req.extracted_text.as_deref(),
            parsed_data: req.parsed_data.as_ref().filter(|r| !r.is_empty()),
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeSummaryRow>>, AppError> {
    Ok(Json(list_resumes_for_user(&state.db, params.user_id).await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeRow>, AppError> {
    Ok(Json(load_owned(&state, id, params.user_id).await?))
}

/// GET /api/v1/resumes/:id/history
pub async fn handle_resume_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ResumeVersionRow>>, AppError> {
    load_owned(&state, id, params.user_id).await?;
    Ok(Json(get_version_history(&state.db, id).await?))
}

/// POST /api/v1/resumes/:id/update-smart
pub async fn handle_smart_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<SmartUpdateRequest>,
) -> Result<Json<UpdateOutcome>, AppError> {
    validate_update_text(&req.update_text, state.config.max_update_text_chars)?;
    let outcome = state
        .updates
        .apply_update(id, req.user_id, &req.update_text)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/resumes/:id/analyze
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ResumeAnalysis>, AppError> {
    let row = load_owned(&state, id, params.user_id).await?;
    let stored = row.parsed_data.unwrap_or(Value::Null);
    let resume = StructuredResume::from_stored(&stored)
        .map_err(|e| {
            AppError::Internal(anyhow::Error::new(e).context(format!("resume {id} data is unreadable")))
        })?
        .ok_or_else(|| AppError::PreconditionFailed(NO_PARSED_DATA.to_string()))?;

    let analysis = analyze_resume(&resume, &state.llm).await?;

    let value = serde_json::to_value(&analysis).map_err(|e| AppError::Internal(e.into()))?;
    if !save_analysis(&state.db, id, params.user_id, &value).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    Ok(Json(analysis))
}

async fn load_owned(state: &AppState, id: Uuid, user_id: Uuid) -> Result<ResumeRow, AppError> {
    fetch_resume(&state.db, id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))
}

/// Rejects blank or oversized updates before any I/O.
fn validate_update_text(text: &str, max_chars: usize) -> Result<(), AppError> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("update_text must not be empty".to_string()));
    }
    let len = text.chars().count();
    if len > max_chars {
        return Err(AppError::Validation(format!(
            "update_text is {len} characters; the limit is {max_chars}"
        )));
    }
    Ok(())
}
