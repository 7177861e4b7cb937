#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # MultiQueue
//!
//! Map a function over a pool of queue workers and collect the results, in
//! order, as one call.
//!
//! ## Overview
//!
//! `MultiQueue::apply_async` takes a target (a callable or the name of one),
//! a batch of argument sets and per-call options. It enqueues one job per
//! argument set on a [`QueueAdapter`](messaging::QueueAdapter), waits until
//! every job is terminal or the timeout passes, and returns either the ordered
//! results or the ordered job handles.
//!
//! ## Guarantees
//!
//! - **Order**: `output[i]` always belongs to `argument_sets[i]`, whatever
//!   order the workers finish in
//! - **All or nothing**: a call returns the complete batch or exactly one error
//! - **Fail fast**: bad modes and malformed argument sets are rejected before
//!   anything is enqueued
//! - **No retraction**: on `Timeout` the pending jobs stay on the queue and may
//!   still run; their results are discarded
//!
//! ## Module Organization
//!
//! - [`messaging`] - invocations, job handles and the queue adapter contract
//! - [`orchestration`] - dispatcher, completion tracker, result reducer, facade
//! - [`execution`] - in-process queue and worker pool
//! - [`registry`] - named-function lookup for workers
//! - [`config`] - layered configuration
//! - [`error`] - structured error handling
//! - [`logging`] - tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use multiqueue::prelude::*;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # async fn example() -> multiqueue::Result<()> {
//! let queue = Arc::new(InMemoryQueue::new("default"));
//! let registry = Arc::new(FunctionRegistry::new());
//! registry.register("mean", |args, _| {
//!     let xs: Vec<f64> = args[0]
//!         .as_array()
//!         .map(|a| a.iter().filter_map(|v| v.as_f64()).collect())
//!         .unwrap_or_default();
//!     Ok(json!(xs.iter().sum::<f64>() / xs.len() as f64))
//! })?;
//! let workers = LocalWorkerPool::start(queue.clone(), registry, 4);
//!
//! let mq = MultiQueue::new(queue);
//! let means = mq
//!     .apply_async(
//!         "mean",
//!         ArgumentSets::positional(vec![vec![json!([0, 11])], vec![json!([2, 12])]]),
//!         ApplyOptions::new(),
//!     )
//!     .await?;
//! assert_eq!(means.into_results(), Some(vec![json!(5.5), json!(7.0)]));
//!
//! workers.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod execution;
pub mod logging;
pub mod messaging;
pub mod orchestration;
pub mod registry;

pub use config::{ConfigManager, MultiQueueConfig, TrackerConfig, WorkerConfig};
pub use error::{JobFailure, MultiQueueError, Result};
pub use messaging::{
    ArgumentSet, ArgumentSets, Args, Invocation, Job, JobError, JobErrorKind, JobHandle, JobId,
    JobState, Kwargs, QueueAdapter, TaskFn, Target,
};
pub use orchestration::{
    ApplyOptions, BatchOutput, CompletionCheck, Dispatcher, MultiQueue, OrderedReducer,
    OutputMode, PollingTracker, ResultReducer,
};

/// Everything needed to run a batch
pub mod prelude {
    pub use crate::execution::{InMemoryQueue, LocalWorkerPool};
    pub use crate::messaging::{ArgumentSet, ArgumentSets, Target};
    pub use crate::orchestration::{ApplyOptions, BatchOutput, MultiQueue, OutputMode};
    pub use crate::registry::FunctionRegistry;
}
