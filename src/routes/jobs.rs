use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::{Form, Json};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::errors::AppError;
use crate::models::api::{CreateJobResponse, JobStatusResponse, ReplayResponse};
use crate::models::job::JobInput;

/// POST /evaluate: queue a new evaluation and return immediately. Accepts a
/// JSON body or form fields.
pub async fn create_job(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<CreateJobResponse>, AppError> {
    let input = job_input(request).await?;
    let job = state.registry.create_job(input).await?;

    Ok(Json(CreateJobResponse {
        id: job.id,
        status: job.status,
    }))
}

/// GET /result/{job_id}: current status, plus the result or error once terminal.
pub async fn get_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let id = parse_job_id(&job_id)?;
    let job = state
        .registry
        .get_job(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    tracing::debug!(job_id = %id, status = %job.status, "Checked job status");
    Ok(Json(job.into()))
}

/// POST /replay/{job_id}: rerun a previous evaluation with identical input.
pub async fn replay_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<ReplayResponse>, AppError> {
    let id = parse_job_id(&job_id)?;
    let job = state.registry.replay_job(id).await?;

    Ok(Json(ReplayResponse {
        replay_of: id,
        new_job_id: job.id,
        status: job.status,
    }))
}

async fn job_input(request: Request) -> Result<JobInput, AppError> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        let Form(input) = Form::<JobInput>::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(input)
    } else {
        let Json(input) = Json::<JobInput>::from_request(request, &())
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        Ok(input)
    }
}

fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("Job {raw} not found")))
}
