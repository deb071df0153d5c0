use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::models::job::JobInput;

/// Job payload handed from the registry to the worker pool.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub job_id: Uuid,
    pub input: JobInput,
}

/// Producer side of the in-process job queue.
///
/// Unbounded, so enqueueing never waits; concurrency is bounded by the number
/// of workers draining the [`JobReceiver`]. After [`JobQueue::close`] no new
/// jobs are accepted and workers exit once the backlog is drained.
#[derive(Clone)]
pub struct JobQueue {
    sender: Arc<StdMutex<Option<mpsc::UnboundedSender<QueuedJob>>>>,
    depth: Arc<AtomicU64>,
}

/// Consumer side, shared by every worker.
#[derive(Clone)]
pub struct JobReceiver {
    receiver: Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>,
    depth: Arc<AtomicU64>,
}

impl JobQueue {
    pub fn new() -> (JobQueue, JobReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicU64::new(0));
        (
            JobQueue {
                sender: Arc::new(StdMutex::new(Some(sender))),
                depth: depth.clone(),
            },
            JobReceiver {
                receiver: Arc::new(Mutex::new(receiver)),
                depth,
            },
        )
    }

    pub fn enqueue(&self, job: QueuedJob) -> Result<(), QueueError> {
        let job_id = job.job_id;
        // Count before sending so a fast worker never decrements below zero.
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        let sent = match self.sender.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(sender) => sender.send(job).is_ok(),
            None => false,
        };
        if !sent {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueError::Closed(job_id));
        }
        metrics::gauge!("evaluation_queue_depth").set(depth as f64);
        Ok(())
    }

    /// Stop accepting jobs. Already queued jobs are still handed out.
    pub fn close(&self) {
        let closed = self.sender.lock().unwrap_or_else(|e| e.into_inner()).take();
        if closed.is_some() {
            tracing::info!(pending = self.depth(), "Job queue closed");
        }
    }

    /// Jobs waiting for a worker.
    pub fn depth(&self) -> u64 {
        self.depth.load(Ordering::SeqCst)
    }
}

impl JobReceiver {
    /// Wait for the next job. `None` once the queue is closed (or every
    /// producer is gone) and drained.
    pub async fn dequeue(&self) -> Option<QueuedJob> {
        let job = self.receiver.lock().await.recv().await?;
        let depth = self
            .depth
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        metrics::gauge!("evaluation_queue_depth").set(depth as f64);
        Some(job)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("job queue is closed; job {0} was not scheduled")]
    Closed(Uuid),
}
