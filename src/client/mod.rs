//! # Task Client
//!
//! Stateless transport wrapper around the remote task service. The
//! [`TaskApi`] trait is the seam the poller, the concurrency driver and the
//! scenarios depend on; [`TaskApiClient`] is the HTTP implementation.

pub mod http;

use async_trait::async_trait;

use crate::error::HarnessResult;
use crate::models::{StatusSnapshot, TaskEndpoint, TaskHandle, TaskPayload};

pub use http::{TaskApiClient, TaskApiConfig};

/// Operations of the remote task service's HTTP contract
///
/// Implementations perform exactly one request per call and never retry.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// `POST {endpoint}`; `201/202` with an `id` yields a handle
    async fn create_task(
        &self,
        endpoint: TaskEndpoint,
        payload: &TaskPayload,
    ) -> HarnessResult<TaskHandle>;

    /// `GET {endpoint}/{id}`
    async fn get_status(&self, endpoint: TaskEndpoint, id: &str) -> HarnessResult<StatusSnapshot>;

    /// `DELETE {endpoint}/{id}`; `Ok(true)` only for `204`
    async fn cancel_task(&self, endpoint: TaskEndpoint, id: &str) -> HarnessResult<bool>;

    /// `GET /health`; pre-flight only
    async fn health_check(&self) -> bool;
}
