//! # Configuration
//!
//! Layered configuration for the facade, the completion tracker and the
//! reference worker pool. Values come from defaults, then optional TOML files,
//! then `MULTIQUEUE__`-prefixed environment variables (see [`ConfigManager`]).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use multiqueue::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let timeout = manager.config().default_timeout();
//! println!("batches wait up to {timeout:?}");
//! # Ok(())
//! # }
//! ```

pub mod loader;

use crate::constants;
use crate::error::{MultiQueueError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use loader::ConfigManager;

/// Root configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MultiQueueConfig {
    /// Seconds a batch may wait for all of its jobs
    pub default_timeout_seconds: u64,

    /// Output mode used when a call does not name one
    pub default_mode: String,

    /// Output modes the facade accepts
    pub modes: Vec<String>,

    pub tracker: TrackerConfig,

    pub worker: WorkerConfig,
}

impl Default for MultiQueueConfig {
    fn default() -> Self {
        Self {
            default_timeout_seconds: constants::DEFAULT_TIMEOUT_SECONDS,
            default_mode: constants::modes::RESULTS.to_string(),
            modes: constants::modes::DEFAULT_MODES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            tracker: TrackerConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl MultiQueueConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.modes.is_empty() {
            return Err(MultiQueueError::configuration(
                "modes",
                "at least one output mode must be configured",
            ));
        }
        if !self.modes.contains(&self.default_mode) {
            return Err(MultiQueueError::configuration(
                "default_mode",
                format!(
                    "default mode \"{}\" is not one of {:?}",
                    self.default_mode, self.modes
                ),
            ));
        }
        self.tracker.validate()?;
        self.worker.validate()
    }
}

/// Poll cadence of the completion tracker
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: constants::DEFAULT_POLL_INTERVAL_MS,
            max_poll_interval_ms: constants::DEFAULT_MAX_POLL_INTERVAL_MS,
            backoff_multiplier: constants::DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_interval(&self) -> Duration {
        Duration::from_millis(self.max_poll_interval_ms)
    }

    /// Next sleep after `current`, grown by the multiplier and capped
    ///
    /// A multiplier that yields no representable duration (NaN, infinite,
    /// negative, overflowing) jumps straight to the cap.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let cap = self.max_poll_interval();
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_multiplier)
            .map_or(cap, |next| next.min(cap))
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms > self.max_poll_interval_ms {
            return Err(MultiQueueError::configuration(
                "tracker",
                format!(
                    "poll_interval_ms ({}) exceeds max_poll_interval_ms ({})",
                    self.poll_interval_ms, self.max_poll_interval_ms
                ),
            ));
        }
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(MultiQueueError::configuration(
                "tracker",
                format!(
                    "backoff_multiplier must be >= 1.0, got {}",
                    self.backoff_multiplier
                ),
            ));
        }
        Ok(())
    }
}

/// Settings for the in-process reference worker pool
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub queue_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: constants::DEFAULT_WORKER_CONCURRENCY,
            queue_name: constants::DEFAULT_QUEUE_NAME.to_string(),
        }
    }
}

impl WorkerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(MultiQueueError::configuration(
                "worker",
                "concurrency must be at least 1",
            ));
        }
        if self.queue_name.trim().is_empty() {
            return Err(MultiQueueError::configuration(
                "worker",
                "queue_name must not be empty",
            ));
        }
        Ok(())
    }
}
