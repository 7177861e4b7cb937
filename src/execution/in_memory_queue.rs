//! # In-Memory Queue
//!
//! A process-local [`QueueAdapter`] for tests, demos and single-process use.
//! Pending work sits in a lock-free FIFO; each job's state lives in a shared
//! [`JobRecord`] that the worker updates and the caller's handle reads.
//!
//! Records are indexed weakly: once neither the worker nor any caller holds a
//! job's handle, its record is dropped and [`InMemoryQueue::fetch_job`] stops
//! finding it.

use crate::error::{MultiQueueError, Result};
use crate::messaging::{
    Invocation, Job, JobError, JobHandle, JobId, JobState, QueueAdapter, Target,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossbeam::queue::SegQueue;
use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Dead index entries are first swept once the index grows past this many;
/// after each sweep the bar moves to twice the surviving entries
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug)]
struct RecordState {
    state: JobState,
    result: Option<Value>,
    error: Option<JobError>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

/// Shared state of one job
#[derive(Debug)]
pub struct JobRecord {
    id: JobId,
    target: String,
    enqueued_at: DateTime<Utc>,
    inner: RwLock<RecordState>,
}

impl JobRecord {
    fn new(target: &Target) -> Self {
        Self {
            id: JobId::new(),
            target: target.name().to_string(),
            enqueued_at: Utc::now(),
            inner: RwLock::new(RecordState {
                state: JobState::Queued,
                result: None,
                error: None,
                started_at: None,
                ended_at: None,
            }),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }

    pub fn state(&self) -> JobState {
        self.inner.read().state
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.inner.read().ended_at
    }

    /// Time spent queued before a worker picked the job up, or so far if it
    /// is still waiting
    pub fn queue_wait(&self) -> chrono::Duration {
        self.started_at().unwrap_or_else(Utc::now) - self.enqueued_at
    }

    /// Queued -> Running; false if the job already moved on
    pub fn mark_running(&self) -> bool {
        let mut inner = self.inner.write();
        if !inner.state.can_transition_to(JobState::Running) {
            return false;
        }
        inner.state = JobState::Running;
        inner.started_at = Some(Utc::now());
        true
    }

    /// Record success; ignored once the job is terminal
    pub fn succeed(&self, result: Value) -> bool {
        let mut inner = self.inner.write();
        if !inner.state.can_transition_to(JobState::Succeeded) {
            warn!(job_id = %self.id, state = %inner.state, "Ignoring late success");
            return false;
        }
        inner.state = JobState::Succeeded;
        inner.result = Some(result);
        inner.ended_at = Some(Utc::now());
        true
    }

    /// Record failure; ignored once the job is terminal
    pub fn fail(&self, error: JobError) -> bool {
        let mut inner = self.inner.write();
        if !inner.state.can_transition_to(JobState::Failed) {
            warn!(job_id = %self.id, state = %inner.state, "Ignoring late failure");
            return false;
        }
        inner.state = JobState::Failed;
        inner.error = Some(error);
        inner.ended_at = Some(Utc::now());
        true
    }
}

/// Caller-side handle onto a [`JobRecord`]
#[derive(Debug, Clone)]
pub struct MemoryJob {
    record: Arc<JobRecord>,
}

impl MemoryJob {
    pub fn record(&self) -> &Arc<JobRecord> {
        &self.record
    }
}

#[async_trait]
impl JobHandle for MemoryJob {
    fn id(&self) -> JobId {
        self.record.id
    }

    async fn state(&self) -> Result<JobState> {
        Ok(self.record.state())
    }

    async fn result(&self) -> Result<Option<Value>> {
        Ok(self.record.inner.read().result.clone())
    }

    async fn error(&self) -> Result<Option<JobError>> {
        Ok(self.record.inner.read().error.clone())
    }
}

/// A job waiting to be picked up by a worker
#[derive(Debug)]
pub struct QueuedJob {
    pub record: Arc<JobRecord>,
    pub invocation: Invocation,
}

#[derive(Debug)]
pub struct InMemoryQueue {
    name: String,
    pending: SegQueue<QueuedJob>,
    index: DashMap<JobId, Weak<JobRecord>>,
    notify: Notify,
    closed: AtomicBool,
    prune_at: AtomicUsize,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: SegQueue::new(),
            index: DashMap::new(),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            prune_at: AtomicUsize::new(PRUNE_THRESHOLD),
        }
    }

    /// Jobs enqueued but not yet picked up
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Refuse new work and wake idle workers; queued jobs can still be drained
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Look up a live job by id
    pub fn fetch_job(&self, id: &JobId) -> Option<Job> {
        let record = self.index.get(id)?.upgrade()?;
        Some(Arc::new(MemoryJob { record }))
    }

    /// Take the next job without waiting
    pub fn try_dequeue(&self) -> Option<QueuedJob> {
        self.pending.pop()
    }

    /// Wait for the next job; `None` once the queue is closed and drained
    pub async fn dequeue(&self) -> Option<QueuedJob> {
        loop {
            if let Some(job) = self.pending.pop() {
                return Some(job);
            }
            if self.is_closed() {
                return None;
            }

            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            // an enqueue may have landed between the pop and registering
            if let Some(job) = self.pending.pop() {
                return Some(job);
            }
            if self.is_closed() {
                return None;
            }
            notified.await;
        }
    }

    fn prune(&self) {
        let before = self.index.len();
        self.index.retain(|_, record| record.strong_count() > 0);
        let live = self.index.len();
        let next = live.saturating_mul(2).max(PRUNE_THRESHOLD);
        self.prune_at.store(next, Ordering::Relaxed);
        debug!(
            queue = %self.name,
            pruned = before.saturating_sub(live),
            live,
            next_prune_at = next,
            "Pruned finished job records"
        );
    }
}

#[async_trait]
impl QueueAdapter for InMemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, invocation: &Invocation) -> Result<Job> {
        if self.is_closed() {
            return Err(MultiQueueError::enqueue(&self.name, "queue is closed"));
        }
        if self.index.len() >= self.prune_at.load(Ordering::Relaxed) {
            self.prune();
        }

        let record = Arc::new(JobRecord::new(invocation.target()));
        self.index.insert(record.id, Arc::downgrade(&record));
        self.pending.push(QueuedJob {
            record: record.clone(),
            invocation: invocation.clone(),
        });
        self.notify.notify_one();

        debug!(queue = %self.name, job_id = %record.id, target = %record.target, "Job queued");
        Ok(Arc::new(MemoryJob { record }))
    }
}
