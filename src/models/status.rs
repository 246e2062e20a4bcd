//! Task status vocabulary and its wire spellings

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HarnessError;

/// Task status as reported by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Accepted but not yet picked up by a worker
    Pending,
    /// Being processed
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Cancellation confirmed
    Cancelled,
    /// Cancel accepted, not yet confirmed. Not a failure.
    Cancelling,
    /// The service gave up on the task on its own
    TimedOut,
}

impl StatusKind {
    /// Check if this is a terminal state (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if a cancel request has been acknowledged
    pub fn is_cancel_acknowledged(&self) -> bool {
        matches!(self, Self::Cancelling | Self::Cancelled)
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Cancelling => write!(f, "cancelling"),
            Self::TimedOut => write!(f, "timeout"),
        }
    }
}

impl std::str::FromStr for StatusKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Ok(Self::Pending),
            "running" | "active" | "processing" | "in_progress" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "cancelling" | "canceling" => Ok(Self::Cancelling),
            "timeout" | "timed_out" => Ok(Self::TimedOut),
            _ => Err(HarnessError::UnknownStatus(s.to_string())),
        }
    }
}
