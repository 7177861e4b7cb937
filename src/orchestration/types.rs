//! Shared types for batch orchestration: output modes, batch output and
//! per-call options.

use crate::constants::modes;
use crate::messaging::{Job, QueueAdapter};
use crate::orchestration::completion_tracker::CompletionCheck;
use crate::orchestration::result_reducer::ResultReducer;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How a finished batch is handed back
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputMode {
    /// Extracted results, in submission order
    Results,
    /// The raw job handles, in submission order
    Jobs,
    /// A mode only a custom reducer understands
    Custom(String),
}

impl OutputMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Results => modes::RESULTS,
            Self::Jobs => modes::JOBS,
            Self::Custom(name) => name,
        }
    }
}

impl From<&str> for OutputMode {
    fn from(s: &str) -> Self {
        match s {
            modes::RESULTS => Self::Results,
            modes::JOBS => Self::Jobs,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for OutputMode {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What `apply_async` returns
#[derive(Debug, Clone)]
pub enum BatchOutput {
    Results(Vec<Value>),
    Jobs(Vec<Job>),
}

impl BatchOutput {
    pub fn len(&self) -> usize {
        match self {
            Self::Results(results) => results.len(),
            Self::Jobs(jobs) => jobs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_results(self) -> Option<Vec<Value>> {
        match self {
            Self::Results(results) => Some(results),
            Self::Jobs(_) => None,
        }
    }

    pub fn into_jobs(self) -> Option<Vec<Job>> {
        match self {
            Self::Jobs(jobs) => Some(jobs),
            Self::Results(_) => None,
        }
    }
}

/// Per-call overrides for [`crate::orchestration::MultiQueue::apply_async`]
///
/// Anything left unset falls back to the facade's defaults.
#[derive(Clone, Default)]
pub struct ApplyOptions {
    pub queue: Option<Arc<dyn QueueAdapter>>,
    pub timeout: Option<Duration>,
    pub mode: Option<OutputMode>,
    pub check: Option<Arc<dyn CompletionCheck>>,
    pub proc: Option<Arc<dyn ResultReducer>>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_queue(mut self, queue: Arc<dyn QueueAdapter>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_timeout_secs(self, seconds: u64) -> Self {
        self.with_timeout(Duration::from_secs(seconds))
    }

    pub fn with_mode(mut self, mode: impl Into<OutputMode>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_check(mut self, check: Arc<dyn CompletionCheck>) -> Self {
        self.check = Some(check);
        self
    }

    pub fn with_proc(mut self, proc: Arc<dyn ResultReducer>) -> Self {
        self.proc = Some(proc);
        self
    }
}

impl fmt::Debug for ApplyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyOptions")
            .field("queue", &self.queue.as_ref().map(|q| q.name().to_string()))
            .field("timeout", &self.timeout)
            .field("mode", &self.mode)
            .field("check", &self.check.is_some())
            .field("proc", &self.proc.is_some())
            .finish()
    }
}
