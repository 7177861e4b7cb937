//! Local worker pool for the in-memory queue
//!
//! Each worker pulls the next job, resolves its target (direct callable or
//! registered name), runs it on the blocking thread pool and records the
//! terminal state on the job record. Panics inside a target fail that job
//! only.

use crate::config::WorkerConfig;
use crate::execution::in_memory_queue::{InMemoryQueue, QueuedJob};
use crate::messaging::{JobError, JobErrorKind, QueueAdapter};
use crate::registry::FunctionRegistry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Counters shared by all workers of a pool
#[derive(Debug, Default)]
pub struct WorkerStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl WorkerStats {
    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn processed(&self) -> u64 {
        self.succeeded() + self.failed()
    }
}

/// A set of tokio tasks draining one [`InMemoryQueue`]
///
/// Must be started from within a tokio runtime.
pub struct LocalWorkerPool {
    workers: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    stats: Arc<WorkerStats>,
}

impl LocalWorkerPool {
    pub fn start(
        queue: Arc<InMemoryQueue>,
        registry: Arc<FunctionRegistry>,
        concurrency: usize,
    ) -> Self {
        let concurrency = concurrency.max(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let stats = Arc::new(WorkerStats::default());

        let workers = (0..concurrency)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    queue.clone(),
                    registry.clone(),
                    shutdown_rx.clone(),
                    stats.clone(),
                ))
            })
            .collect();

        info!(queue = %queue.name(), concurrency, "Worker pool started");
        Self {
            workers,
            shutdown_tx,
            stats,
        }
    }

    pub fn from_config(
        queue: Arc<InMemoryQueue>,
        registry: Arc<FunctionRegistry>,
        config: &WorkerConfig,
    ) -> Self {
        Self::start(queue, registry, config.concurrency)
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn stats(&self) -> &Arc<WorkerStats> {
        &self.stats
    }

    /// Stop pulling new jobs and wait for running ones to finish; jobs still
    /// queued stay queued
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for worker in self.workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Worker task ended abnormally");
            }
        }
        info!(
            succeeded = self.stats.succeeded(),
            failed = self.stats.failed(),
            "Worker pool stopped"
        );
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Arc<InMemoryQueue>,
    registry: Arc<FunctionRegistry>,
    mut shutdown_rx: watch::Receiver<bool>,
    stats: Arc<WorkerStats>,
) {
    debug!(worker_id, "Worker started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }
        let job = tokio::select! {
            job = queue.dequeue() => job,
            changed = shutdown_rx.changed() => {
                // sender dropped without an explicit shutdown
                if changed.is_err() {
                    break;
                }
                continue;
            }
        };
        let Some(job) = job else {
            break;
        };
        execute(worker_id, job, &registry, &stats).await;
    }
    debug!(worker_id, "Worker stopped");
}

async fn execute(worker_id: usize, job: QueuedJob, registry: &FunctionRegistry, stats: &WorkerStats) {
    let QueuedJob { record, invocation } = job;
    if !record.mark_running() {
        warn!(worker_id, job_id = %record.id(), "Skipping job that is no longer queued");
        return;
    }

    let Some(func) = registry.resolve(invocation.target()) else {
        let message = format!("no function registered as \"{}\"", invocation.target().name());
        warn!(worker_id, job_id = %record.id(), "{message}");
        record.fail(JobError::new(JobErrorKind::UnknownTarget, message));
        stats.failed.fetch_add(1, Ordering::Relaxed);
        return;
    };

    debug!(
        worker_id,
        job_id = %record.id(),
        target = %func.name(),
        enqueued_at = %record.enqueued_at(),
        queue_wait_ms = record.queue_wait().num_milliseconds(),
        "Running job"
    );
    let outcome =
        tokio::task::spawn_blocking(move || func.call(invocation.args(), invocation.kwargs()))
            .await;

    match outcome {
        Ok(Ok(value)) => {
            record.succeed(value);
            stats.succeeded.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Err(e)) => {
            debug!(worker_id, job_id = %record.id(), error = %e, "Job returned an error");
            record.fail(JobError::new(JobErrorKind::Execution, format!("{e:#}")));
            stats.failed.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) if e.is_panic() => {
            warn!(worker_id, job_id = %record.id(), "Job panicked");
            record.fail(JobError::new(JobErrorKind::Panicked, "target panicked"));
            stats.failed.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            record.fail(JobError::new(JobErrorKind::Abandoned, e.to_string()));
            stats.failed.fetch_add(1, Ordering::Relaxed);
        }
    }
}
