//! # Structured Logging Module
//!
//! Environment-aware structured logging for batch dispatch. Console output is
//! human-readable by default and switches to JSON with
//! `MULTIQUEUE_LOG_FORMAT=json`. `RUST_LOG` takes precedence over the
//! environment-derived level.

use crate::constants::env as env_vars;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(get_log_level(&environment)));
        let json = std::env::var(env_vars::LOG_FORMAT)
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A host application may already own the global subscriber
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json,
            "Structured logging initialized"
        );
    });
}

fn get_environment() -> String {
    std::env::var(env_vars::ENVIRONMENT)
        .or_else(|_| std::env::var(env_vars::FALLBACK_ENVIRONMENT))
        .unwrap_or_else(|_| "development".to_string())
}

fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        "test" => "warn",
        _ => "debug",
    }
}

/// Log the outcome of one batch
pub fn log_batch_operation(
    batch_id: &str,
    target: &str,
    queue: &str,
    job_count: usize,
    mode: &str,
    status: &str,
    elapsed: Duration,
) {
    tracing::info!(
        batch_id = %batch_id,
        target = %target,
        queue = %queue,
        job_count,
        mode = %mode,
        status = %status,
        elapsed_ms = elapsed.as_millis() as u64,
        "BATCH_OPERATION"
    );
}
