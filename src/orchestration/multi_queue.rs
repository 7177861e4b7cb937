//! # MultiQueue Facade
//!
//! One call that maps a target over a batch of argument sets on remote workers
//! and hands back the ordered results:
//!
//! ```text
//! apply_async -> Dispatcher::submit -> CompletionCheck::await_all -> ResultReducer::reduce
//! ```
//!
//! The facade owns a default queue adapter, tracker, reducer and the set of
//! recognized output modes; each call may override any of them through
//! [`ApplyOptions`]. Concurrent calls share only the queue adapter: every call
//! holds its own job list, so batches never see each other's jobs.
//!
//! A timed-out call does **not** retract its jobs. They stay on the queue, may
//! still run, and their results are dropped.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use multiqueue::execution::{FunctionRegistry, InMemoryQueue, LocalWorkerPool};
//! use multiqueue::messaging::{ArgumentSets, Target};
//! use multiqueue::orchestration::{ApplyOptions, MultiQueue};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> multiqueue::Result<()> {
//! let queue = Arc::new(InMemoryQueue::new("default"));
//! let workers = LocalWorkerPool::start(queue.clone(), Arc::new(FunctionRegistry::new()), 4);
//!
//! let mq = MultiQueue::new(queue);
//! let double = Target::function("double", |args, _| {
//!     Ok(json!(args[0].as_i64().unwrap_or_default() * 2))
//! });
//! let output = mq
//!     .apply_async(
//!         double,
//!         ArgumentSets::positional(vec![vec![json!(1)], vec![json!(2)]]),
//!         ApplyOptions::new().with_timeout_secs(10),
//!     )
//!     .await?;
//! assert_eq!(output.into_results(), Some(vec![json!(2), json!(4)]));
//! workers.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::config::MultiQueueConfig;
use crate::error::{MultiQueueError, Result};
use crate::logging::log_batch_operation;
use crate::messaging::{ArgumentSets, QueueAdapter, Target};
use crate::orchestration::completion_tracker::{CompletionCheck, PollingTracker};
use crate::orchestration::dispatcher::Dispatcher;
use crate::orchestration::result_reducer::{OrderedReducer, ResultReducer};
use crate::orchestration::types::{ApplyOptions, BatchOutput, OutputMode};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;

/// Used when `now + timeout` overflows the clock
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

#[derive(Clone)]
pub struct MultiQueue {
    queue: Arc<dyn QueueAdapter>,
    modes: Vec<OutputMode>,
    check: Arc<dyn CompletionCheck>,
    proc: Arc<dyn ResultReducer>,
    default_timeout: Duration,
    default_mode: OutputMode,
}

impl MultiQueue {
    /// Facade over `queue` with default tracker, reducer and modes
    pub fn new(queue: Arc<dyn QueueAdapter>) -> Self {
        Self::from_parts(queue, &MultiQueueConfig::default())
    }

    /// Facade over `queue` configured from `config`; fails if the config does
    /// not validate
    pub fn from_config(queue: Arc<dyn QueueAdapter>, config: &MultiQueueConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(queue, config))
    }

    fn from_parts(queue: Arc<dyn QueueAdapter>, config: &MultiQueueConfig) -> Self {
        Self {
            queue,
            modes: config.modes.iter().map(|m| OutputMode::from(m.as_str())).collect(),
            check: Arc::new(PollingTracker::new(config.tracker.clone())),
            proc: Arc::new(OrderedReducer::new()),
            default_timeout: config.default_timeout(),
            default_mode: OutputMode::from(config.default_mode.as_str()),
        }
    }

    /// Replace the recognized output modes
    pub fn with_modes<I, M>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<OutputMode>,
    {
        self.modes = modes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_check(mut self, check: Arc<dyn CompletionCheck>) -> Self {
        self.check = check;
        self
    }

    pub fn with_proc(mut self, proc: Arc<dyn ResultReducer>) -> Self {
        self.proc = proc;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_default_mode(mut self, mode: impl Into<OutputMode>) -> Self {
        self.default_mode = mode.into();
        self
    }

    pub fn queue(&self) -> &Arc<dyn QueueAdapter> {
        &self.queue
    }

    pub fn modes(&self) -> &[OutputMode] {
        &self.modes
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Fails with `InvalidMode` unless `mode` is one of the recognized modes
    pub fn validate_mode(&self, mode: &OutputMode) -> Result<()> {
        if self.modes.contains(mode) {
            return Ok(());
        }
        Err(MultiQueueError::invalid_mode(
            mode.as_str(),
            self.modes.iter().map(|m| m.as_str().to_string()).collect(),
        ))
    }

    /// Like [`Self::validate_mode`], and the mode must also be one `proc` can
    /// reduce. The reported modes are the recognized ones `proc` handles.
    fn validate_mode_for(&self, mode: &OutputMode, proc: &dyn ResultReducer) -> Result<()> {
        self.validate_mode(mode)?;
        if proc.supports(mode) {
            return Ok(());
        }
        Err(MultiQueueError::invalid_mode(
            mode.as_str(),
            self.modes
                .iter()
                .filter(|m| proc.supports(m))
                .map(|m| m.as_str().to_string())
                .collect(),
        ))
    }

    /// Run `target` once per argument set on the queue's workers and wait for
    /// the whole batch
    ///
    /// Returns the results (or job handles) in submission order, or exactly one
    /// error: `InvalidMode` / `InvalidArgumentShape` before anything is
    /// enqueued, `Timeout` if the batch did not finish in time, `JobFailed` if
    /// any job failed in `results` mode.
    #[instrument(skip_all)]
    pub async fn apply_async(
        &self,
        target: impl Into<Target>,
        argument_sets: impl Into<ArgumentSets>,
        options: ApplyOptions,
    ) -> Result<BatchOutput> {
        let target = target.into();
        let ApplyOptions {
            queue,
            timeout,
            mode,
            check,
            proc,
        } = options;

        let queue = queue.unwrap_or_else(|| self.queue.clone());
        let check = check.unwrap_or_else(|| self.check.clone());
        let proc = proc.unwrap_or_else(|| self.proc.clone());
        let timeout = timeout.unwrap_or(self.default_timeout);
        let mode = mode.unwrap_or_else(|| self.default_mode.clone());

        self.validate_mode_for(&mode, proc.as_ref())?;

        let batch_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        let jobs = Dispatcher::new(queue.clone())
            .submit(&target, argument_sets.into())
            .await?;
        let job_count = jobs.len();
        info!(
            batch_id = %batch_id,
            target = %target,
            queue = %queue.name(),
            job_count,
            mode = %mode,
            timeout_ms = timeout.as_millis() as u64,
            "Batch submitted, waiting for completion"
        );

        let deadline = Instant::now()
            .checked_add(timeout)
            .unwrap_or_else(|| Instant::now() + FAR_FUTURE);

        let outcome = match check.await_all(jobs, deadline).await {
            Ok(jobs) => proc.reduce(jobs, &mode).await,
            Err(e) => Err(e),
        };

        let status = match &outcome {
            Ok(_) => "completed",
            Err(MultiQueueError::Timeout { .. }) => "timed_out",
            Err(MultiQueueError::JobFailed { .. }) => "failed",
            Err(_) => "error",
        };
        log_batch_operation(
            &batch_id,
            target.name(),
            queue.name(),
            job_count,
            mode.as_str(),
            status,
            started.elapsed(),
        );

        outcome
    }
}
