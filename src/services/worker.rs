use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use crate::services::pipeline::EvaluationPipeline;
use crate::services::queue::{JobReceiver, QueuedJob};
use crate::services::registry::{JobRegistry, RegistryError};

/// Fixed-size pool of tasks draining the job queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn spawn(
        workers: usize,
        receiver: JobReceiver,
        registry: Arc<JobRegistry>,
        pipeline: Arc<EvaluationPipeline>,
    ) -> Self {
        let workers = workers.max(1);
        let handles = (0..workers)
            .map(|worker_id| {
                let receiver = receiver.clone();
                let registry = registry.clone();
                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    tracing::debug!(worker_id, "Worker started");
                    while let Some(job) = receiver.dequeue().await {
                        if let Err(e) = process_job(&registry, &pipeline, job).await {
                            tracing::error!(worker_id, error = %e, "Failed to record job outcome");
                        }
                    }
                    tracing::debug!(worker_id, "Queue closed, worker exiting");
                })
            })
            .collect();

        tracing::info!(workers, "Worker pool ready");
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to drain the queue and exit. Only returns after
    /// the queue has been closed with [`JobRegistry::close_queue`].
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Run one job to a terminal state. Pipeline failures (and panics) become the
/// job's `error`; only registry bookkeeping errors are returned.
pub async fn process_job(
    registry: &JobRegistry,
    pipeline: &Arc<EvaluationPipeline>,
    job: QueuedJob,
) -> Result<(), RegistryError> {
    registry.mark_processing(job.job_id).await?;
    tracing::info!(job_id = %job.job_id, title = %job.input.title, "Processing evaluation job");

    let start = Instant::now();
    let task = {
        let pipeline = pipeline.clone();
        let input = job.input.clone();
        tokio::spawn(async move {
            pipeline
                .evaluate(&input.title, &input.cv_id, &input.project_id)
                .await
        })
    };
    let outcome = task.await;
    metrics::histogram!("evaluation_processing_seconds").record(start.elapsed().as_secs_f64());

    match outcome {
        Ok(Ok(result)) => {
            registry.complete(job.job_id, result.clone()).await?;
            tracing::info!(
                job_id = %job.job_id,
                cv_match_rate = result.cv_match_rate,
                project_score = result.project_score,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Job completed successfully"
            );
        }
        Ok(Err(e)) => {
            tracing::warn!(job_id = %job.job_id, error = %e, timeout = e.is_timeout(), "Job failed");
            registry.fail(job.job_id, e.to_string()).await?;
        }
        Err(join_error) => {
            tracing::error!(job_id = %job.job_id, error = %join_error, "Evaluation task panicked");
            registry
                .fail(job.job_id, format!("evaluation aborted unexpectedly: {join_error}"))
                .await?;
        }
    }

    Ok(())
}
