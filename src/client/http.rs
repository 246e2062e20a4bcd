//! # HTTP Task Client
//!
//! reqwest implementation of [`TaskApi`]. Authentication is a static bearer
//! credential installed as a default header, so every request carries it.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode, Url};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::TaskApi;
use crate::config::ApiConfig;
use crate::error::{HarnessError, HarnessResult};
use crate::models::{CreateTaskResponse, StatusSnapshot, TaskEndpoint, TaskHandle, TaskPayload};

/// Configuration for the task API client
///
/// # Examples
///
/// ```rust
/// use taskprobe::client::TaskApiConfig;
///
/// let config = TaskApiConfig::default();
/// assert_eq!(config.base_url, "http://localhost:3000");
/// assert_eq!(config.timeout_ms, 30000);
/// assert!(config.bearer_token.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct TaskApiConfig {
    /// Base URL the endpoint paths are appended to
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer credential sent on every request
    pub bearer_token: Option<String>,
}

impl Default for TaskApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_ms: 30000,
            bearer_token: None,
        }
    }
}

impl From<&ApiConfig> for TaskApiConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout_ms: config.request_timeout_ms,
            bearer_token: Some(config.api_key.clone()).filter(|k| !k.is_empty()),
        }
    }
}

/// HTTP client for the remote task service
#[derive(Clone)]
pub struct TaskApiClient {
    client: Client,
    config: TaskApiConfig,
    base_url: Url,
}

impl std::fmt::Debug for TaskApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout_ms", &self.config.timeout_ms)
            .field("auth_enabled", &self.config.bearer_token.is_some())
            .finish()
    }
}

impl TaskApiClient {
    /// Create a new client, validating the base URL and credential
    ///
    /// ```rust
    /// use taskprobe::client::{TaskApiClient, TaskApiConfig};
    ///
    /// let client = TaskApiClient::new(TaskApiConfig {
    ///     base_url: "http://localhost:8899".to_string(),
    ///     timeout_ms: 5000,
    ///     bearer_token: Some("test-api-key".to_string()),
    /// })
    /// .unwrap();
    /// assert_eq!(client.base_url(), "http://localhost:8899/");
    /// ```
    pub fn new(config: TaskApiConfig) -> HarnessResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| HarnessError::config_error(format!("Invalid base URL: {e}")))?;

        let mut client_builder = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(format!("taskprobe/{}", env!("CARGO_PKG_VERSION")));

        if let Some(token) = &config.bearer_token {
            let mut default_headers = header::HeaderMap::new();
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| HarnessError::config_error(format!("Invalid bearer token: {e}")))?;
            default_headers.insert(header::AUTHORIZATION, value);
            client_builder = client_builder.default_headers(default_headers);
            debug!("Configured Bearer token authentication");
        } else {
            warn!("No API credential configured; requests are sent unauthenticated");
        }

        let client = client_builder.build().map_err(|e| {
            HarnessError::config_error(format!("Failed to create HTTP client: {e}"))
        })?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            auth_enabled = config.bearer_token.is_some(),
            "Created task API client"
        );

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Build a client from the harness `[api]` section
    pub fn from_config(config: &ApiConfig) -> HarnessResult<Self> {
        Self::new(TaskApiConfig::from(config))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Append `path` to the base URL, keeping any path prefix the base URL has
    fn url(&self, path: &str) -> HarnessResult<Url> {
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined)
            .map_err(|e| HarnessError::config_error(format!("Failed to construct URL: {e}")))
    }

    async fn error_text(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }
}

#[async_trait]
impl TaskApi for TaskApiClient {
    async fn create_task(
        &self,
        endpoint: TaskEndpoint,
        payload: &TaskPayload,
    ) -> HarnessResult<TaskHandle> {
        let url = self.url(endpoint.path())?;
        debug!(url = %url, endpoint = %endpoint, "Submitting task");

        let submitted = Instant::now();
        let response = self.client.post(url).json(payload).send().await?;
        let status = response.status();

        if status == StatusCode::CREATED || status == StatusCode::ACCEPTED {
            let body: CreateTaskResponse = response.json().await.map_err(|e| {
                HarnessError::invalid_response(
                    "id",
                    format!("Failed to parse creation response: {e}"),
                )
            })?;
            info!(task_id = %body.id, endpoint = %endpoint, "Task submitted");
            Ok(TaskHandle::new(body.id, endpoint, submitted))
        } else {
            let message = Self::error_text(response).await;
            error!(
                status = %status,
                error = %message,
                endpoint = %endpoint,
                "Task submission rejected"
            );
            Err(HarnessError::creation_error(status.as_u16(), message))
        }
    }

    async fn get_status(&self, endpoint: TaskEndpoint, id: &str) -> HarnessResult<StatusSnapshot> {
        let url = self.url(&format!("{}/{id}", endpoint.path()))?;
        debug!(url = %url, task_id = %id, "Fetching task status");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::OK {
            let body: serde_json::Value = response.json().await?;
            let snapshot = StatusSnapshot::from_body(body)?;
            debug!(
                task_id = %id,
                status = %snapshot.status,
                completed = snapshot.completed_sub_units,
                total = snapshot.total_sub_units,
                "Task status retrieved"
            );
            Ok(snapshot)
        } else {
            let message = Self::error_text(response).await;
            warn!(status = %status, error = %message, task_id = %id, "Status check failed");
            Err(HarnessError::api_error(status.as_u16(), message))
        }
    }

    async fn cancel_task(&self, endpoint: TaskEndpoint, id: &str) -> HarnessResult<bool> {
        let url = self.url(&format!("{}/{id}", endpoint.path()))?;
        debug!(url = %url, task_id = %id, "Cancelling task");

        let response = self.client.delete(url).send().await?;
        let status = response.status();

        match status {
            StatusCode::NO_CONTENT => {
                info!(task_id = %id, "Cancellation accepted");
                Ok(true)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                let message = Self::error_text(response).await;
                Err(HarnessError::api_error(status.as_u16(), message))
            }
            _ => {
                let message = Self::error_text(response).await;
                warn!(status = %status, error = %message, task_id = %id, "Cancellation refused");
                Ok(false)
            }
        }
    }

    async fn health_check(&self) -> bool {
        let url = match self.url("/health") {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, "Cannot build health check URL");
                return false;
            }
        };

        match self.client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!("Health check passed");
                true
            }
            Ok(response) => {
                warn!(status = %response.status(), "Health check failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Health check request failed");
                false
            }
        }
    }
}
