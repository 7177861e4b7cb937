//! # Queue Adapter
//!
//! Boundary to the external durable work queue. An adapter accepts an
//! [`Invocation`] and hands back a [`Job`] immediately; it must not wait for the
//! job to run. Adapters are shared between concurrent batches and are expected
//! to be safe for that on their own.

use crate::error::Result;
use crate::messaging::invocation::Invocation;
use crate::messaging::job::Job;
use async_trait::async_trait;

#[async_trait]
pub trait QueueAdapter: Send + Sync {
    /// Queue name, used in logs and errors
    fn name(&self) -> &str;

    /// Submit one invocation and return its handle without blocking on execution
    async fn enqueue(&self, invocation: &Invocation) -> Result<Job>;
}
