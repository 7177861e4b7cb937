//! Scripted job handles and a recording queue adapter
//!
//! A [`ScriptedJob`] walks through a fixed list of states, one per status
//! query, and counts how often it was queried. [`RecordingQueue`] keeps every
//! invocation it receives and builds jobs through a caller-supplied script.

use async_trait::async_trait;
use multiqueue::error::{MultiQueueError, Result};
use multiqueue::messaging::{
    Invocation, Job, JobError, JobErrorKind, JobHandle, JobId, JobState, QueueAdapter,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct ScriptedJob {
    id: JobId,
    script: Mutex<VecDeque<JobState>>,
    last: Mutex<JobState>,
    result: Option<Value>,
    error: Option<JobError>,
    polls: AtomicUsize,
    touched: AtomicBool,
    status_errors: AtomicUsize,
}

impl ScriptedJob {
    fn new(states: Vec<JobState>, result: Option<Value>, error: Option<JobError>) -> Self {
        Self {
            id: JobId::new(),
            script: Mutex::new(states.into_iter().collect()),
            last: Mutex::new(JobState::Queued),
            result,
            error,
            polls: AtomicUsize::new(0),
            touched: AtomicBool::new(false),
            status_errors: AtomicUsize::new(0),
        }
    }

    /// Running for `polls` queries, then succeeded with `value`
    pub fn succeeds_after(polls: usize, value: Value) -> Arc<Self> {
        let mut states = vec![JobState::Running; polls];
        states.push(JobState::Succeeded);
        Arc::new(Self::new(states, Some(value), None))
    }

    /// Running for `polls` queries, then failed with `message`
    pub fn fails_after(polls: usize, message: &str) -> Arc<Self> {
        let mut states = vec![JobState::Running; polls];
        states.push(JobState::Failed);
        Arc::new(Self::new(
            states,
            None,
            Some(JobError::new(JobErrorKind::Execution, message)),
        ))
    }

    pub fn never_finishes() -> Arc<Self> {
        Arc::new(Self::new(vec![JobState::Running], None, None))
    }

    /// The first `errors` status queries fail, then the job succeeds
    pub fn flaky_then_succeeds(errors: usize, value: Value) -> Arc<Self> {
        let job = Self::new(vec![JobState::Succeeded], Some(value), None);
        job.status_errors.store(errors, Ordering::SeqCst);
        Arc::new(job)
    }

    /// Number of status queries answered or refused
    pub fn poll_count(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    /// Whether `result()` or `error()` was ever called
    pub fn was_touched(&self) -> bool {
        self.touched.load(Ordering::SeqCst)
    }

    pub fn as_job(self: &Arc<Self>) -> Job {
        self.clone()
    }
}

#[async_trait]
impl JobHandle for ScriptedJob {
    fn id(&self) -> JobId {
        self.id
    }

    async fn state(&self) -> Result<JobState> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let remaining_errors = self.status_errors.load(Ordering::SeqCst);
        if remaining_errors > 0 {
            self.status_errors.store(remaining_errors - 1, Ordering::SeqCst);
            return Err(MultiQueueError::job_status(self.id, "broker unavailable"));
        }

        let mut last = self.last.lock();
        if let Some(next) = self.script.lock().pop_front() {
            *last = next;
        }
        Ok(*last)
    }

    async fn result(&self) -> Result<Option<Value>> {
        self.touched.store(true, Ordering::SeqCst);
        Ok(self.result.clone())
    }

    async fn error(&self) -> Result<Option<JobError>> {
        self.touched.store(true, Ordering::SeqCst);
        Ok(self.error.clone())
    }
}

type JobScript = dyn Fn(usize, &Invocation) -> Arc<ScriptedJob> + Send + Sync;

/// Queue adapter that records every invocation and hands out scripted jobs
pub struct RecordingQueue {
    name: String,
    script: Box<JobScript>,
    fail_at: Option<usize>,
    invocations: Mutex<Vec<Invocation>>,
    jobs: Mutex<Vec<Arc<ScriptedJob>>>,
}

impl RecordingQueue {
    pub fn new<F>(name: &str, script: F) -> Self
    where
        F: Fn(usize, &Invocation) -> Arc<ScriptedJob> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            script: Box::new(script),
            fail_at: None,
            invocations: Mutex::new(Vec::new()),
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Every job succeeds on its first poll, returning its first positional
    /// argument
    pub fn echo(name: &str) -> Self {
        Self::new(name, |_, invocation| {
            let value = invocation.args().first().cloned().unwrap_or(Value::Null);
            ScriptedJob::succeeds_after(0, value)
        })
    }

    /// Refuse the enqueue with this zero-based index
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    pub fn enqueued(&self) -> usize {
        self.invocations.lock().len()
    }

    pub fn jobs(&self) -> Vec<Arc<ScriptedJob>> {
        self.jobs.lock().clone()
    }
}

#[async_trait]
impl QueueAdapter for RecordingQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn enqueue(&self, invocation: &Invocation) -> Result<Job> {
        let mut invocations = self.invocations.lock();
        let index = invocations.len();
        if self.fail_at == Some(index) {
            return Err(MultiQueueError::enqueue(&self.name, "broker refused job"));
        }
        invocations.push(invocation.clone());

        let job = (self.script)(index, invocation);
        self.jobs.lock().push(job.clone());
        Ok(job)
    }
}
