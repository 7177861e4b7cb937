//! # Orchestration Module
//!
//! The dispatch/collection core: submit a batch, wait for it, reduce it.
//!
//! - [`dispatcher`] - ordered submission, one job per argument set
//! - [`completion_tracker`] - bounded wait until every job is terminal
//! - [`result_reducer`] - ordered result extraction or raw job hand-back
//! - [`multi_queue`] - the facade composing the three

pub mod completion_tracker;
pub mod dispatcher;
pub mod multi_queue;
pub mod result_reducer;
pub mod types;

pub use completion_tracker::{CompletionCheck, CompletionSet, PollingTracker};
pub use dispatcher::Dispatcher;
pub use multi_queue::MultiQueue;
pub use result_reducer::{OrderedReducer, ResultReducer};
pub use types::{ApplyOptions, BatchOutput, OutputMode};
