use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::models::evaluation::EvaluationResult;

/// Status of an evaluation job. Only ever moves forward:
/// `queued -> processing -> completed | failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

/// The evaluation request captured at creation time, replayed verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct JobInput {
    #[garde(length(min = 1, max = 200))]
    pub title: String,

    #[serde(alias = "cv_reference")]
    #[garde(length(min = 1, max = 128))]
    pub cv_id: String,

    #[serde(alias = "project_reference")]
    #[garde(length(min = 1, max = 128))]
    pub project_id: String,
}

impl JobInput {
    pub fn new(
        title: impl Into<String>,
        cv_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            cv_id: cv_id.into(),
            project_id: project_id.into(),
        }
    }

    /// Trims surrounding whitespace so a blank field fails validation.
    pub fn normalized(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            cv_id: self.cv_id.trim().to_string(),
            project_id: self.project_id.trim().to_string(),
        }
    }
}

/// A candidate evaluation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub input: JobInput,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result: Option<EvaluationResult>,
    pub error: Option<String>,
    pub replay_of: Option<Uuid>,
}

impl EvaluationJob {
    pub fn new(input: JobInput, replay_of: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            input,
            created_at: now,
            updated_at: now,
            result: None,
            error: None,
            replay_of,
        }
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.advance(JobStatus::Processing)
    }

    pub fn complete(&mut self, result: EvaluationResult) -> Result<(), TransitionError> {
        self.advance(JobStatus::Completed)?;
        self.result = Some(result);
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.advance(JobStatus::Failed)?;
        let error = error.into();
        self.error = Some(if error.trim().is_empty() {
            "Unknown error occurred.".to_string()
        } else {
            error
        });
        Ok(())
    }

    fn advance(&mut self, next: JobStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                job_id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("job {job_id} cannot move from {from} to {to}")]
pub struct TransitionError {
    pub job_id: Uuid,
    pub from: JobStatus,
    pub to: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample_job() -> EvaluationJob {
        EvaluationJob::new(JobInput::new("Backend Engineer", "abc", "def"), None)
    }

    #[test]
    fn test_new_job_is_queued_without_outcome() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn test_forward_transitions() {
        let mut job = sample_job();
        job.start().unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        job.complete(EvaluationResult::default()).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.result.is_some());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_cannot_skip_processing() {
        let mut job = sample_job();
        let err = job.complete(EvaluationResult::default()).unwrap_err();
        assert_eq!(err.from, JobStatus::Queued);
        assert_eq!(err.to, JobStatus::Completed);
        assert!(job.fail("boom").is_err());
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.result.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = sample_job();
        job.start().unwrap();
        job.fail("evaluator unavailable").unwrap();
        assert!(job.start().is_err());
        assert!(job.complete(EvaluationResult::default()).is_err());
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("evaluator unavailable"));
        assert!(job.result.is_none());
    }

    #[test]
    fn test_blank_failure_message_is_replaced() {
        let mut job = sample_job();
        job.start().unwrap();
        job.fail("  ").unwrap();
        assert_eq!(job.error.as_deref(), Some("Unknown error occurred."));
    }

    #[test]
    fn test_status_string_forms() {
        assert_eq!(JobStatus::Processing.to_string(), "processing");
        assert_eq!(JobStatus::from_str("failed").unwrap(), JobStatus::Failed);
        assert_eq!(
            serde_json::to_string(&JobStatus::Queued).unwrap(),
            "\"queued\""
        );
        assert!(JobStatus::Completed.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn test_input_validation() {
        assert!(JobInput::new("Backend Engineer", "abc", "def").validate().is_ok());
        assert!(JobInput::new("", "abc", "def").validate().is_err());
        assert!(JobInput::new("  ", "abc", "def").normalized().validate().is_err());
        assert!(JobInput::new("Backend Engineer", "abc", "").validate().is_err());
    }

    #[test]
    fn test_input_accepts_reference_aliases() {
        let input: JobInput = serde_json::from_str(
            r#"{"title": "Data Engineer", "cv_reference": "a", "project_reference": "b"}"#,
        )
        .unwrap();
        assert_eq!(input, JobInput::new("Data Engineer", "a", "b"));
    }
}
