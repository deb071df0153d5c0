//! Test helper utilities: in-memory collaborators and polling

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use uuid::Uuid;

use cv_evaluator::models::job::{EvaluationJob, JobStatus};
use cv_evaluator::services::llm::{Evaluator, LlmError};
use cv_evaluator::services::pipeline::EvaluationPipeline;
use cv_evaluator::services::queue::JobQueue;
use cv_evaluator::services::registry::JobRegistry;
use cv_evaluator::services::retry::RetryPolicy;
use cv_evaluator::services::storage::{DocumentSource, StorageError};
use cv_evaluator::services::worker::WorkerPool;

/// Document source backed by a fixed map.
pub struct StaticDocuments {
    documents: HashMap<String, String>,
}

impl StaticDocuments {
    pub fn new(documents: &[(&str, &str)]) -> Self {
        Self {
            documents: documents
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl DocumentSource for StaticDocuments {
    async fn resolve_text(&self, file_id: &str) -> Result<String, StorageError> {
        self.documents
            .get(file_id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(file_id.to_string()))
    }
}

/// Evaluator that replays a script of responses, then repeats `then` forever.
pub struct ScriptedEvaluator {
    script: Mutex<VecDeque<Result<String, String>>>,
    then: Result<String, String>,
    calls: AtomicU32,
}

impl ScriptedEvaluator {
    pub fn new(script: Vec<Result<String, String>>, then: Result<String, String>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            then,
            calls: AtomicU32::new(0),
        }
    }

    pub fn always(response: Result<String, String>) -> Self {
        Self::new(Vec::new(), response)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Evaluator for ScriptedEvaluator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.then.clone());
        next.map_err(|message| LlmError::Api {
            status: 503,
            message,
        })
    }
}

/// Evaluator that blocks every call until the test releases a permit.
pub struct GatedEvaluator {
    gate: Arc<Semaphore>,
    response: String,
}

impl GatedEvaluator {
    pub fn new(response: String) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (
            Self {
                gate: gate.clone(),
                response,
            },
            gate,
        )
    }
}

#[async_trait]
impl Evaluator for GatedEvaluator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        self.gate
            .acquire()
            .await
            .expect("gate closed")
            .forget();
        Ok(self.response.clone())
    }
}

/// Evaluator that panics whenever the prompt mentions `trigger`.
pub struct PanickyEvaluator {
    pub trigger: &'static str,
    pub response: String,
}

#[async_trait]
impl Evaluator for PanickyEvaluator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if prompt.contains(self.trigger) {
            panic!("evaluator blew up on {}", self.trigger);
        }
        Ok(self.response.clone())
    }
}

/// Retry policy with negligible delays.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1),
        attempt_timeout: Duration::from_secs(2),
    }
}

pub struct Harness {
    pub registry: Arc<JobRegistry>,
    pub workers: WorkerPool,
}

/// Wire a registry, queue and worker pool around the given collaborators.
pub fn start(
    documents: Arc<dyn DocumentSource>,
    evaluator: Arc<dyn Evaluator>,
    retry: RetryPolicy,
    workers: usize,
) -> Harness {
    let pipeline = Arc::new(EvaluationPipeline::new(documents, evaluator).with_retry(retry));
    let (queue, receiver) = JobQueue::new();
    let registry = Arc::new(JobRegistry::new(queue));
    let workers = WorkerPool::spawn(workers, receiver, registry.clone(), pipeline);
    Harness { registry, workers }
}

/// Poll until the job is terminal, returning it with every status observed.
pub async fn wait_for_terminal(
    registry: &JobRegistry,
    id: Uuid,
) -> (EvaluationJob, Vec<JobStatus>) {
    let mut observed = Vec::new();
    for _ in 0..1000 {
        let job = registry.get_job(id).await.expect("job disappeared");
        if observed.last() != Some(&job.status) {
            observed.push(job.status);
        }
        if job.status.is_terminal() {
            return (job, observed);
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} did not finish; observed {observed:?}");
}

/// Poll until the job reaches `status`.
pub async fn wait_for_status(registry: &JobRegistry, id: Uuid, status: JobStatus) {
    for _ in 0..1000 {
        if registry.get_job(id).await.map(|j| j.status) == Some(status) {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("job {id} never reached {status}");
}

/// Observed statuses must only ever move forward. Polling may miss the
/// short-lived `processing` state, so this checks order rather than steps.
pub fn assert_forward_only(observed: &[JobStatus]) {
    fn rank(status: JobStatus) -> u8 {
        match status {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }
    for pair in observed.windows(2) {
        assert!(
            rank(pair[0]) < rank(pair[1]),
            "illegal transition {} -> {} in {observed:?}",
            pair[0],
            pair[1]
        );
    }
}
