//! # Dispatcher
//!
//! Submits one job per argument set, strictly in input order, and returns the
//! handles in that same order. `jobs[i]` always corresponds to
//! `argument_sets[i]`; this is the only correlation the caller gets.
//!
//! Argument shapes are validated before the first enqueue, so a malformed batch
//! never leaves partial work on the queue. An enqueue failure part way through
//! does leave the earlier jobs queued; they are not retracted.

use crate::error::{MultiQueueError, Result};
use crate::messaging::{ArgumentSets, Invocation, Job, QueueAdapter, Target};
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct Dispatcher {
    queue: Arc<dyn QueueAdapter>,
}

impl Dispatcher {
    pub fn new(queue: Arc<dyn QueueAdapter>) -> Self {
        Self { queue }
    }

    pub fn queue(&self) -> &Arc<dyn QueueAdapter> {
        &self.queue
    }

    /// Enqueue one job per argument set and return the ordered handles
    #[instrument(skip_all, fields(queue = %self.queue.name(), target = %target))]
    pub async fn submit(&self, target: &Target, argument_sets: ArgumentSets) -> Result<Vec<Job>> {
        let invocations: Vec<Invocation> = argument_sets
            .expand()?
            .into_iter()
            .map(|arguments| Invocation::new(target.clone(), arguments))
            .collect();

        let mut jobs = Vec::with_capacity(invocations.len());
        for (index, invocation) in invocations.iter().enumerate() {
            let job = self.queue.enqueue(invocation).await.map_err(|e| match e {
                MultiQueueError::Enqueue { .. } => e,
                other => MultiQueueError::enqueue(self.queue.name(), other.to_string()),
            })?;
            debug!(index, job_id = %job.id(), "Job enqueued");
            jobs.push(job);
        }

        debug!(job_count = jobs.len(), "Batch submitted");
        Ok(jobs)
    }
}
