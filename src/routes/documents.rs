use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app_state::AppState;
use crate::errors::AppError;
use crate::models::api::{DocumentListResponse, UploadResponse};
use crate::services::storage;

/// POST /upload: store a CV and a project report. Both are validated before
/// either is written.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut cv: Option<(String, Vec<u8>)> = None;
    let mut project: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let slot = match field.name() {
            Some("cv") => &mut cv,
            Some("project") => &mut project,
            _ => continue,
        };
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("uploaded part is missing a filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        *slot = Some((filename, data.to_vec()));
    }

    let (cv_name, cv_data) =
        cv.ok_or_else(|| AppError::Validation("missing 'cv' file".to_string()))?;
    let (project_name, project_data) =
        project.ok_or_else(|| AppError::Validation("missing 'project' file".to_string()))?;

    for name in [&cv_name, &project_name] {
        if !storage::is_allowed(name) {
            return Err(AppError::UnsupportedMediaType(format!(
                "file {name} is not one of: {}",
                storage::ALLOWED_EXTENSIONS.join(", ")
            )));
        }
    }

    let cv = state.documents.save(&cv_name, &cv_data).await?;
    let project = match state.documents.save(&project_name, &project_data).await {
        Ok(project) => project,
        Err(e) => {
            // Never keep half an upload
            if let Err(cleanup) = state.documents.delete(&cv.file_id.to_string()).await {
                tracing::warn!(file_id = %cv.file_id, error = %cleanup, "Failed to remove orphaned CV");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        cv_id = %cv.file_id,
        project_id = %project.file_id,
        "Received candidate documents"
    );

    Ok(Json(UploadResponse { cv, project }))
}

/// GET /documents: every stored document.
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state.documents.list().await?;
    Ok(Json(DocumentListResponse { documents }))
}

/// DELETE /documents/{file_id}
pub async fn delete_document(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.documents.delete(&file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
