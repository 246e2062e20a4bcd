use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use taskprobe::client::TaskApi;
use taskprobe::error::{HarnessError, HarnessResult};
use taskprobe::models::{StatusKind, StatusSnapshot, TaskEndpoint, TaskHandle, TaskPayload};

/// What a scripted status request answers
#[derive(Debug, Clone)]
pub enum StatusReply {
    Status(StatusKind),
    /// Raw status body, parsed the way the HTTP client parses it
    Body(Value),
    /// Non-200 answer with this status code
    HttpError(u16),
}

/// What a scripted submission answers
#[derive(Debug, Clone)]
pub enum CreateReply {
    Accept,
    Reject { status: u16, body: String },
}

/// In-memory task service that replays scripted answers
///
/// Every created task walks the same status script with its own cursor; the
/// last entry repeats once the script is exhausted. Submissions answer from
/// the create queue first and accept once it is empty.
pub struct ScriptedTaskApi {
    status_script: Vec<StatusReply>,
    create_replies: Mutex<VecDeque<CreateReply>>,
    cursors: Mutex<HashMap<String, usize>>,
    cancel_accepts: bool,
    healthy: bool,
    create_delay: Duration,
    next_id: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
    pub cancel_calls: AtomicUsize,
}

impl ScriptedTaskApi {
    pub fn new(status_script: Vec<StatusReply>) -> Self {
        Self {
            status_script,
            create_replies: Mutex::new(VecDeque::new()),
            cursors: Mutex::new(HashMap::new()),
            cancel_accepts: true,
            healthy: true,
            create_delay: Duration::ZERO,
            next_id: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            cancel_calls: AtomicUsize::new(0),
        }
    }

    /// Script that reports `statuses` in order
    pub fn with_statuses(statuses: &[StatusKind]) -> Self {
        Self::new(statuses.iter().copied().map(StatusReply::Status).collect())
    }

    pub fn with_create_replies(self, replies: Vec<CreateReply>) -> Self {
        *self.create_replies.lock() = replies.into();
        self
    }

    pub fn with_cancel_accepted(mut self, accepted: bool) -> Self {
        self.cancel_accepts = accepted;
        self
    }

    pub fn with_health(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    pub fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = delay;
        self
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self, id: &str) -> StatusReply {
        let mut cursors = self.cursors.lock();
        let cursor = cursors.entry(id.to_string()).or_insert(0);
        let reply = match self.status_script.len() {
            0 => StatusReply::Status(StatusKind::Pending),
            len => self.status_script[(*cursor).min(len - 1)].clone(),
        };
        *cursor += 1;
        reply
    }
}

#[async_trait]
impl TaskApi for ScriptedTaskApi {
    async fn create_task(
        &self,
        endpoint: TaskEndpoint,
        _payload: &TaskPayload,
    ) -> HarnessResult<TaskHandle> {
        let submitted = Instant::now();
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        let reply = self
            .create_replies
            .lock()
            .pop_front()
            .unwrap_or(CreateReply::Accept);
        match reply {
            CreateReply::Accept => {
                let id = format!("task-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
                Ok(TaskHandle::new(id, endpoint, submitted))
            }
            CreateReply::Reject { status, body } => Err(HarnessError::creation_error(status, body)),
        }
    }

    async fn get_status(&self, _endpoint: TaskEndpoint, id: &str) -> HarnessResult<StatusSnapshot> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        match self.next_reply(id) {
            StatusReply::Status(kind) => Ok(StatusSnapshot::with_status(kind)),
            StatusReply::Body(body) => StatusSnapshot::from_body(body),
            StatusReply::HttpError(status) => Err(HarnessError::api_error(status, "scripted error")),
        }
    }

    async fn cancel_task(&self, _endpoint: TaskEndpoint, _id: &str) -> HarnessResult<bool> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.cancel_accepts)
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }
}
