//! # Constants
//!
//! Defaults shared by configuration, the facade and the reference worker.

/// Output mode names recognized out of the box
pub mod modes {
    pub const RESULTS: &str = "results";
    pub const JOBS: &str = "jobs";

    /// Default recognized mode set, in the order reported by `InvalidMode`
    pub const DEFAULT_MODES: [&str; 2] = [JOBS, RESULTS];
}

/// Wait bound for a batch when the caller gives none
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 1000;

/// First sleep between completion sweeps
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5;

/// Upper bound on the sleep between completion sweeps
pub const DEFAULT_MAX_POLL_INTERVAL_MS: u64 = 250;

pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

pub const DEFAULT_WORKER_CONCURRENCY: usize = 4;

pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Environment variables consulted at startup
pub mod env {
    pub const ENVIRONMENT: &str = "MULTIQUEUE_ENV";
    pub const FALLBACK_ENVIRONMENT: &str = "APP_ENV";
    pub const CONFIG_DIR: &str = "MULTIQUEUE_CONFIG_DIR";
    pub const LOG_FORMAT: &str = "MULTIQUEUE_LOG_FORMAT";
    /// Prefix for config overrides, e.g. `MULTIQUEUE__TRACKER__POLL_INTERVAL_MS`
    pub const CONFIG_PREFIX: &str = "MULTIQUEUE";
}
