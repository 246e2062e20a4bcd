//! Harness-side verdict for one task lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::task::StatusSnapshot;

/// Exactly one of these is produced per submitted task
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The service reported `completed`
    Success {
        snapshot: StatusSnapshot,
        latency: Duration,
    },
    /// The service reported `failed`, a remote timeout, or a status we do not understand
    Failure { reason: String, latency: Duration },
    /// The service confirmed cancellation. Interpretation is left to the caller.
    Cancelled {
        snapshot: StatusSnapshot,
        latency: Duration,
    },
    /// The poll budget ran out before a terminal status was observed
    TimedOut { latency: Duration, attempts: u32 },
    /// The invocation could not talk to the service (or crashed)
    TransportError { reason: String, latency: Duration },
}

/// Discriminant of an [`Outcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Failure,
    Cancelled,
    TimedOut,
    TransportError,
}

impl Outcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success { .. } => OutcomeKind::Success,
            Self::Failure { .. } => OutcomeKind::Failure,
            Self::Cancelled { .. } => OutcomeKind::Cancelled,
            Self::TimedOut { .. } => OutcomeKind::TimedOut,
            Self::TransportError { .. } => OutcomeKind::TransportError,
        }
    }

    /// End-to-end latency, measured for every kind of outcome
    pub fn latency(&self) -> Duration {
        match self {
            Self::Success { latency, .. }
            | Self::Failure { latency, .. }
            | Self::Cancelled { latency, .. }
            | Self::TimedOut { latency, .. }
            | Self::TransportError { latency, .. } => *latency,
        }
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency().as_nanos() as f64 / 1_000_000.0
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn snapshot(&self) -> Option<&StatusSnapshot> {
        match self {
            Self::Success { snapshot, .. } | Self::Cancelled { snapshot, .. } => Some(snapshot),
            _ => None,
        }
    }

    pub fn transport_error(reason: impl Into<String>, latency: Duration) -> Self {
        Self::TransportError {
            reason: reason.into(),
            latency,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ms = self.latency_ms();
        match self {
            Self::Success { .. } => write!(f, "success in {ms:.0}ms"),
            Self::Failure { reason, .. } => write!(f, "failure after {ms:.0}ms: {reason}"),
            Self::Cancelled { .. } => write!(f, "cancelled after {ms:.0}ms"),
            Self::TimedOut { attempts, .. } => {
                write!(f, "timed out after {attempts} attempts ({ms:.0}ms)")
            }
            Self::TransportError { reason, .. } => {
                write!(f, "transport error after {ms:.0}ms: {reason}")
            }
        }
    }
}
