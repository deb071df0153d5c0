use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::evaluation::EvaluationResult;
use crate::models::job::{EvaluationJob, JobStatus};
use crate::services::storage::StoredDocument;

/// Response after submitting an evaluation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub id: Uuid,
    pub status: JobStatus,
}

/// Response for polling a job. `result` and `error` only appear once the job
/// is terminal.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<EvaluationResult>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl From<EvaluationJob> for JobStatusResponse {
    fn from(job: EvaluationJob) -> Self {
        let (result, error) = match job.status {
            JobStatus::Queued | JobStatus::Processing => (None, None),
            JobStatus::Completed => (Some(job.result.unwrap_or_default()), None),
            JobStatus::Failed => (
                None,
                Some(
                    job.error
                        .unwrap_or_else(|| "Unknown error occurred.".to_string()),
                ),
            ),
        };

        Self {
            id: job.id,
            status: job.status,
            result,
            error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplayResponse {
    pub replay_of: Uuid,
    pub new_job_id: Uuid,
    pub status: JobStatus,
}

/// Aggregate view over every job the registry has seen.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub total_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub avg_cv_match_rate: f64,
    pub avg_project_score: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub cv: StoredDocument,
    pub project: StoredDocument,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<StoredDocument>,
}
