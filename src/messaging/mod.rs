//! # Messaging Module
//!
//! The contracts shared with the external queue: invocations going in, job
//! handles coming back, and the adapter trait in between.

pub mod invocation;
pub mod job;
pub mod queue;

pub use invocation::*;
pub use job::*;
pub use queue::*;
