//! # Data Model
//!
//! Typed requests, status snapshots and outcomes exchanged between the task
//! client, the completion poller and the aggregator.

pub mod outcome;
pub mod requests;
pub mod status;
pub mod task;

pub use outcome::{Outcome, OutcomeKind};
pub use requests::{
    CrawlRequest, CrawlerOptions, ExtractRequest, ExtractRule, ScrapeOptions, ScrapeRequest,
    SearchRequest, TaskPayload,
};
pub use status::StatusKind;
pub use task::{CreateTaskResponse, StatusSnapshot, TaskEndpoint, TaskHandle, TaskStatusBody};
