use std::collections::HashMap;

use garde::Validate;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::evaluation::EvaluationResult;
use crate::models::job::{EvaluationJob, JobInput, JobStatus, TransitionError};
use crate::services::queue::{JobQueue, QueuedJob};

/// In-memory owner of every job record for the lifetime of the process.
///
/// Each mutation takes the write lock once, so readers only ever observe
/// whole records in a legal state. Jobs are never evicted.
pub struct JobRegistry {
    jobs: RwLock<HashMap<Uuid, EvaluationJob>>,
    queue: JobQueue,
}

/// Aggregate counts and averages across the registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStats {
    pub total: usize,
    pub queued: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    /// Means over completed jobs; 0.0 when none have completed.
    pub avg_cv_match_rate: f64,
    pub avg_project_score: f64,
}

impl JobRegistry {
    pub fn new(queue: JobQueue) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            queue,
        }
    }

    /// Record a new queued job and hand it to the worker pool.
    ///
    /// Only malformed input fails here; everything downstream surfaces as the
    /// job's terminal state.
    pub async fn create_job(&self, input: JobInput) -> Result<EvaluationJob, RegistryError> {
        self.insert_and_schedule(input, None).await
    }

    /// Snapshot of a job.
    pub async fn get_job(&self, id: Uuid) -> Option<EvaluationJob> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Submit the exact input of an existing job as a new job. The original
    /// is left untouched.
    pub async fn replay_job(&self, id: Uuid) -> Result<EvaluationJob, RegistryError> {
        let input = self
            .jobs
            .read()
            .await
            .get(&id)
            .map(|job| job.input.clone())
            .ok_or(RegistryError::NotFound(id))?;

        let job = self.insert_and_schedule(input, Some(id)).await?;
        info!(replay_of = %id, job_id = %job.id, "Replayed job");
        Ok(job)
    }

    pub async fn mark_processing(&self, id: Uuid) -> Result<EvaluationJob, RegistryError> {
        self.update(id, |job| job.start()).await
    }

    pub async fn complete(
        &self,
        id: Uuid,
        result: EvaluationResult,
    ) -> Result<EvaluationJob, RegistryError> {
        let job = self.update(id, |job| job.complete(result)).await?;
        metrics::counter!("evaluation_jobs_completed").increment(1);
        Ok(job)
    }

    pub async fn fail(&self, id: Uuid, reason: impl Into<String>) -> Result<EvaluationJob, RegistryError> {
        let reason = reason.into();
        let job = self.update(id, |job| job.fail(reason)).await?;
        metrics::counter!("evaluation_jobs_failed").increment(1);
        Ok(job)
    }

    pub async fn stats(&self) -> JobStats {
        let jobs = self.jobs.read().await;
        let mut stats = JobStats {
            total: jobs.len(),
            ..JobStats::default()
        };
        let mut cv_sum = 0.0;
        let mut score_sum = 0.0;

        for job in jobs.values() {
            match job.status {
                JobStatus::Queued => stats.queued += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Failed => stats.failed += 1,
                JobStatus::Completed => {
                    stats.completed += 1;
                    if let Some(result) = &job.result {
                        cv_sum += result.cv_match_rate;
                        score_sum += result.project_score;
                    }
                }
            }
        }

        if stats.completed > 0 {
            stats.avg_cv_match_rate = cv_sum / stats.completed as f64;
            stats.avg_project_score = score_sum / stats.completed as f64;
        }
        stats
    }

    pub fn queue_depth(&self) -> u64 {
        self.queue.depth()
    }

    /// Stop scheduling new jobs. Jobs created afterwards fail immediately;
    /// jobs already queued still run.
    pub fn close_queue(&self) {
        self.queue.close();
    }

    async fn insert_and_schedule(
        &self,
        input: JobInput,
        replay_of: Option<Uuid>,
    ) -> Result<EvaluationJob, RegistryError> {
        let input = input.normalized();
        input
            .validate()
            .map_err(|report| RegistryError::Validation(report.to_string()))?;

        let job = EvaluationJob::new(input, replay_of);
        self.jobs.write().await.insert(job.id, job.clone());
        metrics::counter!("evaluation_jobs_total").increment(1);
        info!(job_id = %job.id, title = %job.input.title, "Job created");

        let queued = QueuedJob {
            job_id: job.id,
            input: job.input.clone(),
        };
        if let Err(e) = self.queue.enqueue(queued) {
            // Only happens while shutting down; the job still reaches a terminal state.
            error!(job_id = %job.id, error = %e, "Failed to schedule job");
            self.mark_processing(job.id).await?;
            return self.fail(job.id, e.to_string()).await;
        }

        Ok(job)
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<EvaluationJob, RegistryError>
    where
        F: FnOnce(&mut EvaluationJob) -> Result<(), TransitionError>,
    {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get_mut(&id).ok_or(RegistryError::NotFound(id))?;
        apply(job)?;
        Ok(job.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("job {0} not found")]
    NotFound(Uuid),

    #[error("invalid job input: {0}")]
    Validation(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}
