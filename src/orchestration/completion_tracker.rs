//! # Completion Tracker
//!
//! Waits until every job in a batch is terminal or the deadline passes.
//!
//! The default [`PollingTracker`] sweeps the jobs that are not yet known to be
//! terminal, sleeps with capped exponential backoff, and sweeps again. A job
//! observed terminal is recorded in a [`CompletionSet`] and never queried
//! again, so jobs may finish in any order without wasted status queries.
//!
//! Timing out does not touch the queue: jobs still pending keep running on
//! their workers and whatever they produce is discarded by this crate.

use crate::config::TrackerConfig;
use crate::error::{MultiQueueError, Result};
use crate::messaging::Job;
use async_trait::async_trait;
use futures::future::join_all;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, warn};

/// Strategy for waiting on a batch
#[async_trait]
pub trait CompletionCheck: Send + Sync {
    /// Return the jobs once all are terminal, or fail with `Timeout` naming the
    /// indices still pending at `deadline`
    async fn await_all(&self, jobs: Vec<Job>, deadline: Instant) -> Result<Vec<Job>>;
}

/// Which batch indices have been observed terminal
#[derive(Debug, Clone)]
pub struct CompletionSet {
    done: Vec<bool>,
    remaining: usize,
}

impl CompletionSet {
    pub fn new(len: usize) -> Self {
        Self {
            done: vec![false; len],
            remaining: len,
        }
    }

    /// Record index as terminal; repeated marks are no-ops
    pub fn mark(&mut self, index: usize) {
        if let Some(slot) = self.done.get_mut(index) {
            if !*slot {
                *slot = true;
                self.remaining -= 1;
            }
        }
    }

    pub fn is_done(&self, index: usize) -> bool {
        self.done.get(index).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Indices not yet observed terminal, ascending
    pub fn pending(&self) -> Vec<usize> {
        self.done
            .iter()
            .enumerate()
            .filter_map(|(i, done)| (!done).then_some(i))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollingTracker {
    config: TrackerConfig,
}

impl PollingTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config }
    }

    /// Same as [`Self::new`] but rejects a config that does not validate
    pub fn try_new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Query every pending job once; terminal ones are marked
    async fn sweep(&self, jobs: &[Job], completion: &mut CompletionSet) {
        let pending = completion.pending();
        let checks = pending.iter().map(|&index| {
            let job = &jobs[index];
            async move { (index, job.is_terminal().await) }
        });

        for (index, outcome) in join_all(checks).await {
            match outcome {
                Ok(true) => {
                    debug!(index, job_id = %jobs[index].id(), "Job reached terminal state");
                    completion.mark(index);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(index, job_id = %jobs[index].id(), error = %e, "Job status query failed");
                }
            }
        }
    }
}

#[async_trait]
impl CompletionCheck for PollingTracker {
    async fn await_all(&self, jobs: Vec<Job>, deadline: Instant) -> Result<Vec<Job>> {
        let started = Instant::now();
        let mut completion = CompletionSet::new(jobs.len());
        let mut interval = self.config.poll_interval();

        loop {
            if completion.is_complete() {
                return Ok(jobs);
            }

            self.sweep(&jobs, &mut completion).await;
            if completion.is_complete() {
                debug!(
                    job_count = jobs.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "All jobs terminal"
                );
                return Ok(jobs);
            }

            let now = Instant::now();
            if now >= deadline {
                let pending = completion.pending();
                let timeout = deadline.saturating_duration_since(started);
                error!(
                    pending = ?pending,
                    timeout_ms = timeout.as_millis() as u64,
                    "Batch timed out; pending jobs stay on the queue"
                );
                return Err(MultiQueueError::timeout(pending, timeout));
            }

            sleep(interval.min(deadline - now)).await;
            interval = self.config.next_interval(interval);
        }
    }
}
