//! Shared worker pool.
//!
//! Executors wrap their job with [`PooledJob::new`], which hands back the
//! [`Completion`] the job signals when it finishes. The pool only decides
//! when and where a job runs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{oneshot, Semaphore};

use crate::pipeline::Job;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Worker pool is closed")]
    Closed,

    #[error("No tokio runtime available for the worker pool: {0}")]
    NoRuntime(String),
}

/// What a finished job reports through its completion signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed,
    Failed(String),
}

/// Receiving end of a job's completion signal.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<JobOutcome>,
}

impl Completion {
    /// Wait for the job to finish. `None` when the job was dropped without
    /// signalling (it panicked or the pool discarded it).
    pub async fn wait(self) -> Option<JobOutcome> {
        self.rx.await.ok()
    }
}

/// A job paired with the sender of its completion signal.
pub struct PooledJob {
    label: String,
    job: Option<Box<dyn Job>>,
    done: Option<oneshot::Sender<JobOutcome>>,
}

impl PooledJob {
    pub fn new(job: Box<dyn Job>) -> (Self, Completion) {
        let (tx, rx) = oneshot::channel();
        let pooled = Self {
            label: job.label().to_string(),
            job: Some(job),
            done: Some(tx),
        };
        (pooled, Completion { rx })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Process the job on the current thread and signal completion.
    ///
    /// A panic inside the job is caught and logged; the signal is then never
    /// sent, so the waiter observes a dropped sender.
    pub fn run(mut self) {
        let Some(job) = self.job.take() else {
            return;
        };
        let done = self.done.take();

        let outcome = match panic::catch_unwind(AssertUnwindSafe(|| job.process())) {
            Ok(Ok(())) => JobOutcome::Completed,
            Ok(Err(e)) => {
                tracing::warn!("{} failed: {}", self.label, e);
                JobOutcome::Failed(e.to_string())
            }
            Err(_) => {
                tracing::error!("{} panicked", self.label);
                return;
            }
        };

        if let Some(done) = done {
            if done.send(outcome).is_err() {
                tracing::debug!("{} finished after its waiter left", self.label);
            }
        }
    }
}

impl Drop for PooledJob {
    fn drop(&mut self) {
        if self.job.is_some() {
            tracing::warn!("{} dropped before it ran", self.label);
        }
    }
}

/// Anything that can run submitted jobs.
pub trait WorkerPool: Send + Sync {
    fn submit(&self, job: PooledJob) -> Result<(), PoolError>;
}

/// Runs jobs on tokio's blocking threads, at most `workers` at a time.
#[derive(Debug, Clone)]
pub struct TokioWorkerPool {
    semaphore: Arc<Semaphore>,
    handle: Handle,
    workers: usize,
}

impl TokioWorkerPool {
    /// Create a pool on the current tokio runtime.
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        let handle = Handle::try_current().map_err(|e| PoolError::NoRuntime(e.to_string()))?;
        Ok(Self::with_handle(workers, handle))
    }

    pub fn with_handle(workers: usize, handle: Handle) -> Self {
        let workers = workers.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            handle,
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Stop accepting jobs. Jobs still waiting for a slot are dropped.
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

impl WorkerPool for TokioWorkerPool {
    fn submit(&self, job: PooledJob) -> Result<(), PoolError> {
        if self.semaphore.is_closed() {
            return Err(PoolError::Closed);
        }

        let semaphore = self.semaphore.clone();
        self.handle.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                tracing::debug!("Pool closed before {} started", job.label());
                return;
            };
            let label = job.label().to_string();
            if let Err(e) = tokio::task::spawn_blocking(move || job.run()).await {
                tracing::error!("Worker task for {} failed: {}", label, e);
            }
        });
        Ok(())
    }
}
