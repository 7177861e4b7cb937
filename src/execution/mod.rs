//! # Execution Module
//!
//! A process-local stand-in for the external queue and its workers: an
//! [`InMemoryQueue`] implementing [`QueueAdapter`](crate::messaging::QueueAdapter)
//! and a [`LocalWorkerPool`] that drains it. Useful for tests and for running
//! batches inside a single process; production deployments plug their own
//! adapter into [`MultiQueue`](crate::orchestration::MultiQueue) instead.

pub mod in_memory_queue;
pub mod worker_pool;

pub use in_memory_queue::{InMemoryQueue, JobRecord, MemoryJob, QueuedJob};
pub use worker_pool::{LocalWorkerPool, WorkerStats};

// Named targets are resolved by the worker pool through this registry
pub use crate::registry::FunctionRegistry;
