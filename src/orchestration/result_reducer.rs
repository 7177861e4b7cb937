//! # Result Reducer
//!
//! Turns a batch of terminal jobs into the caller's output.
//!
//! In `results` mode the default [`OrderedReducer`] extracts each job's result
//! in submission order. If any job failed the whole batch fails with
//! `JobFailed`, listing every failed index with its error; no partial result
//! list is ever returned. In `jobs` mode the handles are returned untouched and
//! failures are left for the caller to inspect.
//!
//! [`ResultReducer::supports`] lets the facade reject a mode the reducer cannot
//! handle before anything is enqueued.

use crate::constants::modes;
use crate::error::{JobFailure, MultiQueueError, Result};
use crate::messaging::{Job, JobError, JobErrorKind, JobState};
use crate::orchestration::types::{BatchOutput, OutputMode};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error};

#[async_trait]
pub trait ResultReducer: Send + Sync {
    /// Whether `reduce` accepts `mode`; checked before any job is enqueued
    fn supports(&self, _mode: &OutputMode) -> bool {
        true
    }

    async fn reduce(&self, jobs: Vec<Job>, mode: &OutputMode) -> Result<BatchOutput>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderedReducer;

impl OrderedReducer {
    pub fn new() -> Self {
        Self
    }

    async fn extract_results(&self, jobs: &[Job]) -> Result<Vec<Value>> {
        let mut results = Vec::with_capacity(jobs.len());
        let mut failures = Vec::new();

        for (index, job) in jobs.iter().enumerate() {
            match job.state().await? {
                JobState::Succeeded => {
                    results.push(job.result().await?.unwrap_or(Value::Null));
                }
                JobState::Failed => {
                    let error = job.error().await?.unwrap_or_else(|| {
                        JobError::new(JobErrorKind::Execution, "no error info recorded")
                    });
                    failures.push(JobFailure {
                        index,
                        job_id: job.id(),
                        error,
                    });
                }
                state => {
                    return Err(MultiQueueError::job_status(
                        job.id(),
                        format!("job at index {index} is not terminal (state: {state})"),
                    ));
                }
            }
        }

        if !failures.is_empty() {
            error!(
                failed = failures.len(),
                batch_size = jobs.len(),
                first_failed_index = failures[0].index,
                "Batch has failed jobs"
            );
            return Err(MultiQueueError::JobFailed { failures });
        }
        Ok(results)
    }
}

#[async_trait]
impl ResultReducer for OrderedReducer {
    fn supports(&self, mode: &OutputMode) -> bool {
        matches!(mode, OutputMode::Results | OutputMode::Jobs)
    }

    async fn reduce(&self, jobs: Vec<Job>, mode: &OutputMode) -> Result<BatchOutput> {
        match mode {
            OutputMode::Results => {
                let results = self.extract_results(&jobs).await?;
                debug!(result_count = results.len(), "Results extracted");
                Ok(BatchOutput::Results(results))
            }
            OutputMode::Jobs => Ok(BatchOutput::Jobs(jobs)),
            OutputMode::Custom(other) => Err(MultiQueueError::invalid_mode(
                other.clone(),
                modes::DEFAULT_MODES.iter().map(|m| m.to_string()).collect(),
            )),
        }
    }
}
