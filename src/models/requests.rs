//! Request bodies, one type per task endpoint.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::task::TaskEndpoint;

/// Selector rule for scrape-time extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractRule {
    pub selector: String,
    #[serde(default)]
    pub is_array: bool,
}

/// Scrape options carried in the `payload` field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOptions {
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extract_rules: HashMap<String, ExtractRule>,
}

/// `POST /v1/scrape`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formats: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<ScrapeOptions>,
}

impl ScrapeRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Extract a single element's text under `name`
    pub fn with_rule(mut self, name: impl Into<String>, selector: impl Into<String>) -> Self {
        self.task_type = Some("scrape".to_string());
        self.payload
            .get_or_insert_with(ScrapeOptions::default)
            .extract_rules
            .insert(
                name.into(),
                ExtractRule {
                    selector: selector.into(),
                    is_array: false,
                },
            );
        self
    }

    pub fn with_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.formats = Some(formats.into_iter().map(Into::into).collect());
        self
    }
}

/// Crawl traversal settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
}

/// `POST /v1/crawl`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crawler_options: Option<CrawlerOptions>,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>, max_depth: u32, limit: u32) -> Self {
        Self {
            url: url.into(),
            crawler_options: Some(CrawlerOptions {
                max_depth: Some(max_depth),
                limit: Some(limit),
                strategy: Some("bfs".to_string()),
                ..Default::default()
            }),
        }
    }
}

/// `POST /v1/search`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// `POST /v1/extract`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Body of a task submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskPayload {
    Scrape(ScrapeRequest),
    Crawl(CrawlRequest),
    Search(SearchRequest),
    Extract(ExtractRequest),
    /// Arbitrary JSON, for probing input validation
    Raw(serde_json::Value),
}

impl TaskPayload {
    /// Endpoint the payload is meant for; `None` for raw payloads
    pub fn endpoint(&self) -> Option<TaskEndpoint> {
        match self {
            Self::Scrape(_) => Some(TaskEndpoint::Scrape),
            Self::Crawl(_) => Some(TaskEndpoint::Crawl),
            Self::Search(_) => Some(TaskEndpoint::Search),
            Self::Extract(_) => Some(TaskEndpoint::Extract),
            Self::Raw(_) => None,
        }
    }
}

impl From<ScrapeRequest> for TaskPayload {
    fn from(value: ScrapeRequest) -> Self {
        Self::Scrape(value)
    }
}

impl From<CrawlRequest> for TaskPayload {
    fn from(value: CrawlRequest) -> Self {
        Self::Crawl(value)
    }
}

impl From<SearchRequest> for TaskPayload {
    fn from(value: SearchRequest) -> Self {
        Self::Search(value)
    }
}

impl From<ExtractRequest> for TaskPayload {
    fn from(value: ExtractRequest) -> Self {
        Self::Extract(value)
    }
}
