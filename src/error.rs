//! # Error Types
//!
//! Structured error handling for batch dispatch using thiserror. Validation
//! errors (`InvalidArgumentShape`, `InvalidMode`) are raised before any job is
//! enqueued; `Timeout` and `JobFailed` are raised after submission and never
//! retract work that is already on the queue.

use crate::messaging::job::{JobError, JobId};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// One failed job inside a batch, identified by its submission index
#[derive(Debug, Clone, PartialEq)]
pub struct JobFailure {
    pub index: usize,
    pub job_id: JobId,
    pub error: JobError,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] job {}: {}", self.index, self.job_id, self.error)
    }
}

#[derive(Error, Debug)]
pub enum MultiQueueError {
    #[error("Invalid argument shape: {reason}")]
    InvalidArgumentShape { reason: String },

    #[error("Invalid mode \"{mode}\"; available modes are: {available:?}")]
    InvalidMode { mode: String, available: Vec<String> },

    #[error("Timed out after {timeout:?} waiting for jobs at indices {pending:?}")]
    Timeout {
        pending: Vec<usize>,
        timeout: Duration,
    },

    #[error("{} job(s) failed: {}", failures.len(), format_failures(failures))]
    JobFailed { failures: Vec<JobFailure> },

    #[error("Enqueue failed on queue {queue}: {message}")]
    Enqueue { queue: String, message: String },

    #[error("Status query failed for job {job_id}: {message}")]
    JobStatus { job_id: JobId, message: String },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },

    #[error("Registry error: {message}")]
    Registry { message: String },
}

fn format_failures(failures: &[JobFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl MultiQueueError {
    pub fn invalid_argument_shape(reason: impl Into<String>) -> Self {
        Self::InvalidArgumentShape {
            reason: reason.into(),
        }
    }

    pub fn invalid_mode(mode: impl Into<String>, available: Vec<String>) -> Self {
        Self::InvalidMode {
            mode: mode.into(),
            available,
        }
    }

    pub fn timeout(pending: Vec<usize>, timeout: Duration) -> Self {
        Self::Timeout { pending, timeout }
    }

    pub fn enqueue(queue: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Enqueue {
            queue: queue.into(),
            message: message.into(),
        }
    }

    pub fn job_status(job_id: JobId, message: impl Into<String>) -> Self {
        Self::JobStatus {
            job_id,
            message: message.into(),
        }
    }

    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    /// True for errors raised before anything reached the queue
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgumentShape { .. } | Self::InvalidMode { .. }
        )
    }

    /// Indices still pending when a `Timeout` fired
    pub fn pending_indices(&self) -> Option<&[usize]> {
        match self {
            Self::Timeout { pending, .. } => Some(pending),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for MultiQueueError {
    fn from(err: config::ConfigError) -> Self {
        MultiQueueError::configuration("config", err.to_string())
    }
}

impl From<serde_json::Error> for MultiQueueError {
    fn from(err: serde_json::Error) -> Self {
        MultiQueueError::configuration("serialization", err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MultiQueueError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::job::JobErrorKind;

    #[test]
    fn test_invalid_mode_message_lists_available_modes() {
        let err = MultiQueueError::invalid_mode("bogus", vec!["jobs".into(), "results".into()]);
        let msg = err.to_string();
        assert!(msg.contains("bogus"));
        assert!(msg.contains("jobs"));
        assert!(msg.contains("results"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_timeout_exposes_pending_indices() {
        let err = MultiQueueError::timeout(vec![1, 3], Duration::from_secs(2));
        assert_eq!(err.pending_indices(), Some(&[1usize, 3][..]));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_job_failed_display_includes_every_index() {
        let failures = vec![
            JobFailure {
                index: 0,
                job_id: JobId::new(),
                error: JobError::new(JobErrorKind::Execution, "boom"),
            },
            JobFailure {
                index: 4,
                job_id: JobId::new(),
                error: JobError::new(JobErrorKind::UnknownTarget, "no such function"),
            },
        ];
        let msg = MultiQueueError::JobFailed { failures }.to_string();
        assert!(msg.starts_with("2 job(s) failed"));
        assert!(msg.contains("[0]"));
        assert!(msg.contains("[4]"));
    }
}
