//! # Structured Logging Module
//!
//! Console logging for interactive runs plus an optional JSON file per run for
//! post-mortem analysis of load tests.

use chrono::Utc;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::models::{Outcome, TaskHandle};

static LOGGER_INITIALIZED: OnceLock<Option<WorkerGuard>> = OnceLock::new();

/// Initialize structured logging once per process
///
/// `RUST_LOG` wins over the configured level. When `log_dir` is set and can be
/// created, a JSON log file named `taskprobe.<pid>.<timestamp>.log` is written
/// alongside console output.
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
        };

        let console = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(filter());

        let (file_layer, guard, log_path) = match prepare_log_dir(config.log_dir.as_deref()) {
            Some(log_dir) => {
                let file_name = format!(
                    "taskprobe.{}.{}.log",
                    process::id(),
                    Utc::now().format("%Y%m%d_%H%M%S")
                );
                let appender = tracing_appender::rolling::never(&log_dir, &file_name);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_ansi(false)
                    .json()
                    .with_filter(filter());
                (Some(layer), Some(guard), Some(log_dir.join(file_name)))
            }
            None => (None, None, None),
        };

        // Another subscriber may already be installed (tests, embedding binaries)
        if tracing_subscriber::registry()
            .with(console)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            pid = process::id(),
            log_file = ?log_path.as_ref().map(|p| p.display().to_string()),
            "Structured logging initialized"
        );

        guard
    });
}

fn prepare_log_dir(log_dir: Option<&str>) -> Option<PathBuf> {
    let dir = PathBuf::from(log_dir?);
    match std::fs::create_dir_all(&dir) {
        Ok(()) => Some(dir),
        Err(e) => {
            eprintln!(
                "taskprobe: cannot create log directory {}: {e}; logging to console only",
                dir.display()
            );
            None
        }
    }
}

/// Log structured data for a task lifecycle event
pub fn log_task_operation(
    operation: &str,
    handle: &TaskHandle,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        task_id = %handle.id,
        endpoint = %handle.endpoint,
        status = %status,
        details = details,
        elapsed_ms = handle.elapsed().as_millis() as u64,
        "TASK_OPERATION"
    );
}

/// Log the verdict for one load-test invocation
pub fn log_invocation_outcome(index: usize, outcome: &Outcome) {
    match outcome {
        Outcome::Success { .. } => tracing::info!(
            invocation = index,
            kind = ?outcome.kind(),
            latency_ms = outcome.latency_ms(),
            "INVOCATION_OUTCOME"
        ),
        _ => tracing::warn!(
            invocation = index,
            kind = ?outcome.kind(),
            latency_ms = outcome.latency_ms(),
            detail = %outcome,
            "INVOCATION_OUTCOME"
        ),
    }
}
