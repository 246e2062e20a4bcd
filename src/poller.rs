//! # Completion Poller
//!
//! Bounded poll loop that turns a submitted [`TaskHandle`] into exactly one
//! [`Outcome`].
//!
//! Every attempt sleeps `poll_interval` and then issues one status request.
//! Terminal statuses end the loop at once; in-flight statuses (`pending`,
//! `running`, `cancelling`) continue it. A failed status check consumes an
//! attempt but does not fail the task, except for authentication failures,
//! which end the loop as a transport error. Latency is always measured from
//! submission, not from poll-loop entry.
//!
//! The poller never cancels anything: a task whose cancellation was requested
//! is polled until the service confirms it or the budget runs out.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::client::TaskApi;
use crate::error::HarnessError;
use crate::logging::log_task_operation;
use crate::models::{Outcome, StatusKind, StatusSnapshot, TaskHandle};

/// Poll budget for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Sleep before each status request
    pub poll_interval: Duration,
    /// Maximum number of status requests
    pub max_attempts: u32,
    /// Optional wall-clock budget measured from submission
    pub max_wait: Option<Duration>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_attempts: 30,
            max_wait: None,
        }
    }
}

/// Stateless driver of the per-task poll loop
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionPoller {
    config: PollerConfig,
}

impl CompletionPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    /// Poll `handle` until a terminal status, a transport dead end or budget exhaustion
    pub async fn poll<C>(&self, client: &C, handle: &TaskHandle) -> Outcome
    where
        C: TaskApi + ?Sized,
    {
        let mut attempts = 0;

        while attempts < self.config.max_attempts {
            if self.wall_clock_exhausted(handle) {
                break;
            }

            sleep(self.config.poll_interval).await;
            attempts += 1;

            match client.get_status(handle.endpoint, &handle.id).await {
                Ok(snapshot) => {
                    debug!(
                        task_id = %handle.id,
                        attempt = attempts,
                        status = %snapshot.status,
                        completed = snapshot.completed_sub_units,
                        total = snapshot.total_sub_units,
                        "Polled task status"
                    );
                    if let Some(outcome) = Self::classify(handle, snapshot) {
                        return outcome;
                    }
                }
                Err(err) => {
                    if let Some(outcome) = Self::classify_error(handle, attempts, err) {
                        return outcome;
                    }
                }
            }
        }

        log_task_operation(
            "poll",
            handle,
            "timed_out",
            Some(&format!("no terminal status after {attempts} attempts")),
        );
        Outcome::TimedOut {
            latency: handle.elapsed(),
            attempts,
        }
    }

    fn wall_clock_exhausted(&self, handle: &TaskHandle) -> bool {
        self.config
            .max_wait
            .is_some_and(|max_wait| handle.elapsed() + self.config.poll_interval > max_wait)
    }

    /// Map a snapshot to a verdict; `None` means keep polling
    fn classify(handle: &TaskHandle, snapshot: StatusSnapshot) -> Option<Outcome> {
        let latency = handle.elapsed();
        match snapshot.status {
            StatusKind::Completed => {
                log_task_operation("poll", handle, "completed", None);
                Some(Outcome::Success { snapshot, latency })
            }
            StatusKind::Failed => {
                let reason = snapshot
                    .error
                    .clone()
                    .unwrap_or_else(|| "task failed without an error message".to_string());
                log_task_operation("poll", handle, "failed", Some(&reason));
                Some(Outcome::Failure { reason, latency })
            }
            StatusKind::Cancelled => {
                log_task_operation("poll", handle, "cancelled", None);
                Some(Outcome::Cancelled { snapshot, latency })
            }
            StatusKind::TimedOut => {
                let reason = snapshot
                    .error
                    .clone()
                    .unwrap_or_else(|| "task timed out on the service".to_string());
                log_task_operation("poll", handle, "remote_timeout", Some(&reason));
                Some(Outcome::Failure { reason, latency })
            }
            StatusKind::Pending | StatusKind::Running | StatusKind::Cancelling => None,
        }
    }

    /// Map a failed status check to a verdict; `None` means the attempt is spent and polling goes on
    fn classify_error(handle: &TaskHandle, attempt: u32, err: HarnessError) -> Option<Outcome> {
        let latency = handle.elapsed();
        match err {
            HarnessError::Auth { .. } => {
                let reason = err.to_string();
                log_task_operation("poll", handle, "auth_failed", Some(&reason));
                Some(Outcome::TransportError { reason, latency })
            }
            HarnessError::UnknownStatus(_) => {
                let reason = err.to_string();
                log_task_operation("poll", handle, "unknown_status", Some(&reason));
                Some(Outcome::Failure { reason, latency })
            }
            other if other.is_recoverable() => {
                warn!(
                    task_id = %handle.id,
                    attempt,
                    error = %other,
                    "Status check failed; counting against poll budget"
                );
                None
            }
            other => {
                let reason = other.to_string();
                log_task_operation("poll", handle, "unrecoverable", Some(&reason));
                Some(Outcome::TransportError { reason, latency })
            }
        }
    }
}
