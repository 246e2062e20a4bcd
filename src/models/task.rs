//! Task identity and status snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use super::status::StatusKind;
use crate::error::{HarnessError, HarnessResult};

/// Task-accepting endpoints of the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskEndpoint {
    Scrape,
    Crawl,
    Search,
    Extract,
}

impl TaskEndpoint {
    /// Collection path; individual tasks live at `{path}/{id}`
    pub fn path(&self) -> &'static str {
        match self {
            Self::Scrape => "/v1/scrape",
            Self::Crawl => "/v1/crawl",
            Self::Search => "/v1/search",
            Self::Extract => "/v1/extract",
        }
    }
}

impl fmt::Display for TaskEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl std::str::FromStr for TaskEndpoint {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches("/v1/").trim_start_matches('/') {
            "scrape" => Ok(Self::Scrape),
            "crawl" => Ok(Self::Crawl),
            "search" => Ok(Self::Search),
            "extract" => Ok(Self::Extract),
            other => Err(HarnessError::config_error(format!(
                "Unknown task endpoint: {other}"
            ))),
        }
    }
}

/// A successfully submitted task
///
/// Owned by the poller that tracks it. `submitted` is the monotonic instant
/// taken just before the submission request was sent, so latencies computed
/// from it cover the whole task lifecycle.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub id: String,
    pub endpoint: TaskEndpoint,
    pub submitted_at: DateTime<Utc>,
    submitted: Instant,
}

impl TaskHandle {
    pub fn new(id: impl Into<String>, endpoint: TaskEndpoint, submitted: Instant) -> Self {
        Self {
            id: id.into(),
            endpoint,
            submitted_at: Utc::now(),
            submitted,
        }
    }

    /// Time since submission
    pub fn elapsed(&self) -> Duration {
        self.submitted.elapsed()
    }
}

/// Body of a `201/202` answer to a task submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskResponse {
    pub id: String,
}

/// Fields of a status body the harness interprets; everything else stays opaque
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusBody {
    pub status: String,
    #[serde(default)]
    pub completed_tasks: Option<u64>,
    #[serde(default)]
    pub total_tasks: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// One observation of a task's state
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    pub status: StatusKind,
    pub completed_sub_units: u64,
    pub total_sub_units: u64,
    /// Full response body
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl StatusSnapshot {
    /// Build a snapshot from a raw status body
    pub fn from_body(body: serde_json::Value) -> HarnessResult<Self> {
        let parsed: TaskStatusBody = serde_json::from_value(body.clone())
            .map_err(|e| HarnessError::invalid_response("status", e.to_string()))?;
        let status = parsed.status.parse::<StatusKind>()?;

        Ok(Self {
            status,
            completed_sub_units: parsed.completed_tasks.unwrap_or(0),
            total_sub_units: parsed.total_tasks.unwrap_or(0),
            payload: body,
            error: parsed.error,
        })
    }

    /// Snapshot with an empty payload, mostly useful for scripted clients
    pub fn with_status(status: StatusKind) -> Self {
        Self {
            status,
            completed_sub_units: 0,
            total_sub_units: 0,
            payload: serde_json::Value::Null,
            error: None,
        }
    }

    /// Look up a nested payload field by `/`-separated JSON pointer
    pub fn field(&self, pointer: &str) -> Option<&serde_json::Value> {
        self.payload.pointer(pointer)
    }

    /// True when the field exists and is not null, empty, zero or false
    pub fn has_content(&self, pointer: &str) -> bool {
        match self.field(pointer) {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Array(a)) => !a.is_empty(),
            Some(serde_json::Value::Object(o)) => !o.is_empty(),
            Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(serde_json::Value::Bool(b)) => *b,
        }
    }
}
