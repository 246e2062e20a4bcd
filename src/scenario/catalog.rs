//! Standard scenario suite for the task service.
//!
//! Each scenario is a submit → poll → assert case. The order matters: rate
//! limiting runs last because it deliberately exhausts the request quota.

use anyhow::Context;
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, info};

use super::{Scenario, ScenarioContext, ScenarioVerdict};
use crate::client::{TaskApi, TaskApiClient, TaskApiConfig};
use crate::driver::ConcurrencyDriver;
use crate::error::HarnessError;
use crate::models::{
    CrawlRequest, CrawlerOptions, ExtractRequest, Outcome, ScrapeRequest, SearchRequest,
    TaskEndpoint, TaskPayload,
};
use crate::poller::{CompletionPoller, PollerConfig};

/// Requests sent while probing for `429`; the service allows 100 per minute
pub const RATE_LIMIT_PROBE_REQUESTS: usize = 105;

/// Tasks submitted at once by the concurrency scenario
pub const CONCURRENT_TASKS: usize = 5;

const FULL_CRAWL_URL: &str = "https://httpbin.org/links/5/0";
const INVALID_CREDENTIAL: &str = "invalid-key";

/// The full suite, in execution order
pub fn standard_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("scrape basic", scrape_basic),
        Scenario::new("crawl basic", crawl_basic),
        Scenario::new("search basic", search_basic),
        Scenario::new("extract basic", extract_basic),
        Scenario::new("scrape screenshot", scrape_screenshot),
        Scenario::new("crawl full", crawl_full),
        Scenario::new("task cancellation", task_cancellation),
        Scenario::new("concurrent tasks", concurrent_tasks),
        Scenario::new("error handling", error_handling),
        Scenario::new("rate limiting", rate_limiting),
    ]
}

/// Submit one task and poll it to an outcome
async fn submit_and_wait(
    ctx: &ScenarioContext,
    poller: CompletionPoller,
    endpoint: TaskEndpoint,
    payload: TaskPayload,
) -> anyhow::Result<Outcome> {
    let handle = ctx
        .client
        .create_task(endpoint, &payload)
        .await
        .with_context(|| format!("submitting task to {endpoint}"))?;
    debug!(task_id = %handle.id, endpoint = %endpoint, "Scenario task submitted");
    Ok(poller.poll(ctx.client.as_ref(), &handle).await)
}

fn target_url(ctx: &ScenarioContext) -> String {
    ctx.config.load.target_url.clone()
}

/// Verdict for outcomes that did not complete
fn not_completed(outcome: &Outcome) -> ScenarioVerdict {
    ScenarioVerdict::fail(format!("task did not complete: {outcome}"))
}

pub async fn scrape_basic(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let request = ScrapeRequest::new(target_url(&ctx)).with_rule("title", "title");
    let outcome = submit_and_wait(&ctx, ctx.poller, TaskEndpoint::Scrape, request.into()).await?;

    Ok(match outcome.snapshot() {
        Some(snapshot) if outcome.is_success() => match snapshot.field("/content/title") {
            Some(title) if snapshot.has_content("/content/title") => {
                ScenarioVerdict::pass(format!("extracted title {title}"))
            }
            _ => ScenarioVerdict::fail("completed without an extracted title"),
        },
        _ => not_completed(&outcome),
    })
}

pub async fn crawl_basic(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let request = CrawlRequest::new(target_url(&ctx), 1, 10);
    let outcome = submit_and_wait(&ctx, ctx.poller, TaskEndpoint::Crawl, request.into()).await?;

    Ok(match outcome.snapshot() {
        Some(snapshot) if outcome.is_success() => {
            let crawled = snapshot
                .field("/urls_crawled")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0);
            if crawled > 0 {
                ScenarioVerdict::pass(format!("{crawled} urls crawled"))
            } else {
                ScenarioVerdict::fail("completed without crawling any url")
            }
        }
        _ => not_completed(&outcome),
    })
}

pub async fn search_basic(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let request = SearchRequest {
        query: "rust programming language".to_string(),
        sources: Some(vec!["web".to_string()]),
        limit: Some(5),
    };
    let outcome = submit_and_wait(&ctx, ctx.poller, TaskEndpoint::Search, request.into()).await?;

    let Some(snapshot) = outcome.snapshot().filter(|_| outcome.is_success()) else {
        return Ok(not_completed(&outcome));
    };
    let results = snapshot
        .field("/data/web")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default();

    Ok(match results.first() {
        None => ScenarioVerdict::fail("completed without search results"),
        Some(first) if ["title", "url", "snippet"].iter().all(|k| first.get(*k).is_some()) => {
            ScenarioVerdict::pass(format!("{} search results", results.len()))
        }
        Some(first) => ScenarioVerdict::fail(format!("malformed search result: {first}")),
    })
}

pub async fn extract_basic(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let request = ExtractRequest {
        urls: vec![target_url(&ctx)],
        prompt: Some("Extract the page title and any headings (h1, h2, h3)".to_string()),
    };
    let outcome = submit_and_wait(&ctx, ctx.poller, TaskEndpoint::Extract, request.into()).await?;

    Ok(match outcome.snapshot() {
        Some(snapshot) if outcome.is_success() && snapshot.has_content("/data") => {
            ScenarioVerdict::pass("extracted data present")
        }
        Some(_) if outcome.is_success() => {
            ScenarioVerdict::fail("completed without extracted data")
        }
        _ => not_completed(&outcome),
    })
}

pub async fn scrape_screenshot(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let request = ScrapeRequest::new(target_url(&ctx)).with_formats(["screenshot"]);
    let outcome = submit_and_wait(&ctx, ctx.poller, TaskEndpoint::Scrape, request.into()).await?;

    Ok(match outcome.snapshot() {
        Some(snapshot) if outcome.is_success() && snapshot.has_content("/data/screenshot") => {
            ScenarioVerdict::pass("screenshot data present")
        }
        Some(_) if outcome.is_success() => {
            ScenarioVerdict::fail("completed without screenshot data")
        }
        _ => not_completed(&outcome),
    })
}

/// Deeper crawl; gets twice the usual poll budget
pub async fn crawl_full(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let request = CrawlRequest {
        url: FULL_CRAWL_URL.to_string(),
        crawler_options: Some(CrawlerOptions {
            max_depth: Some(1),
            limit: Some(10),
            ..Default::default()
        }),
    };
    let base = *ctx.poller.config();
    let poller = CompletionPoller::new(PollerConfig {
        max_attempts: base.max_attempts.saturating_mul(2),
        max_wait: base.max_wait.map(|w| w * 2),
        ..base
    });
    let outcome = submit_and_wait(&ctx, poller, TaskEndpoint::Crawl, request.into()).await?;

    Ok(match outcome.snapshot() {
        Some(snapshot) if outcome.is_success() => ScenarioVerdict::pass(format!(
            "crawl completed, stats {}",
            snapshot.field("/stats").cloned().unwrap_or_default()
        )),
        _ => not_completed(&outcome),
    })
}

/// Cancel a long crawl and check the service acknowledges it
///
/// A single status read after cancelling is enough: `cancelling` and
/// `cancelled` both count as acknowledgement.
pub async fn task_cancellation(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let endpoint = TaskEndpoint::Crawl;
    let payload: TaskPayload = CrawlRequest::new(target_url(&ctx), 3, 100).into();
    let handle = ctx.client.create_task(endpoint, &payload).await?;
    let settle = ctx.poller.config().poll_interval;

    // Let the task start before cancelling it
    sleep(settle).await;
    if !ctx.client.cancel_task(endpoint, &handle.id).await? {
        return Ok(ScenarioVerdict::fail(format!(
            "cancellation of {} was not accepted",
            handle.id
        )));
    }

    sleep(settle).await;
    let snapshot = ctx.client.get_status(endpoint, &handle.id).await?;
    Ok(if snapshot.status.is_cancel_acknowledged() {
        ScenarioVerdict::pass(format!("task {} is {}", handle.id, snapshot.status))
    } else {
        ScenarioVerdict::fail(format!(
            "task {} still {} after cancellation",
            handle.id, snapshot.status
        ))
    })
}

pub async fn concurrent_tasks(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let poller = ctx.poller;
    let url = target_url(&ctx);

    let results = ConcurrencyDriver::new(CONCURRENT_TASKS)
        .run(CONCURRENT_TASKS, |_| {
            let client = ctx.client.clone();
            let payload: TaskPayload = ScrapeRequest::new(url.clone())
                .with_rule("title", "title")
                .into();
            async move {
                let handle = client.create_task(TaskEndpoint::Scrape, &payload).await?;
                Ok(poller.poll(client.as_ref(), &handle).await)
            }
        })
        .await;

    let mut failures: Vec<_> = results.iter().filter(|r| !r.outcome.is_success()).collect();
    failures.sort_by_key(|r| r.index);
    let succeeded = results.len() - failures.len();

    Ok(if failures.is_empty() {
        ScenarioVerdict::pass(format!("{succeeded}/{CONCURRENT_TASKS} tasks completed"))
    } else {
        let detail = failures
            .iter()
            .map(|r| format!("task {}: {}", r.index, r.outcome))
            .collect::<Vec<_>>()
            .join("; ");
        ScenarioVerdict::fail(format!(
            "{succeeded}/{CONCURRENT_TASKS} tasks completed; {detail}"
        ))
    })
}

/// Compare a submission result against the expected rejection status
fn expect_rejection<T>(
    case: &str,
    result: Result<T, HarnessError>,
    expected: u16,
) -> Option<String> {
    match result {
        Err(err) if err.status() == Some(expected) => {
            debug!(case, status = expected, "Rejected as expected");
            None
        }
        Err(err) => Some(format!("{case}: expected {expected}, got {err}")),
        Ok(_) => Some(format!("{case}: expected {expected}, task was accepted")),
    }
}

/// Invalid input must be rejected with `422`, a bad credential with `401`
pub async fn error_handling(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let endpoint = TaskEndpoint::Scrape;
    let mut mismatches = Vec::new();

    let invalid_url = TaskPayload::Raw(json!({
        "url": "not-a-valid-url",
        "task_type": "scrape",
        "payload": {}
    }));
    let result = ctx.client.create_task(endpoint, &invalid_url).await;
    mismatches.extend(expect_rejection("invalid url", result, 422));

    let missing_url = TaskPayload::Raw(json!({"task_type": "scrape", "payload": {}}));
    let result = ctx.client.create_task(endpoint, &missing_url).await;
    mismatches.extend(expect_rejection("missing url", result, 422));

    let unauthorized = TaskApiClient::new(TaskApiConfig {
        bearer_token: Some(INVALID_CREDENTIAL.to_string()),
        ..TaskApiConfig::from(&ctx.config.api)
    })
    .context("building client with an invalid credential")?;
    let valid = TaskPayload::Raw(json!({
        "url": "https://example.com",
        "task_type": "scrape",
        "payload": {}
    }));
    let result = unauthorized.create_task(endpoint, &valid).await;
    mismatches.extend(expect_rejection("invalid credential", result, 401));

    Ok(if mismatches.is_empty() {
        ScenarioVerdict::pass("422/422/401 as expected")
    } else {
        ScenarioVerdict::fail(mismatches.join("; "))
    })
}

/// Burst submissions until the service answers `429` with a rate-limit error
pub async fn rate_limiting(ctx: ScenarioContext) -> anyhow::Result<ScenarioVerdict> {
    let payload = TaskPayload::Raw(json!({
        "url": "https://example.com",
        "task_type": "scrape",
        "payload": {}
    }));

    for attempt in 1..=RATE_LIMIT_PROBE_REQUESTS {
        match ctx.client.create_task(TaskEndpoint::Scrape, &payload).await {
            Err(HarnessError::Creation {
                status: 429,
                message,
            }) => {
                info!(attempt, "Rate limit triggered");
                return Ok(if mentions_rate_limit(&message) {
                    ScenarioVerdict::pass(format!("rate limited at request {attempt}"))
                } else {
                    ScenarioVerdict::fail(format!(
                        "429 at request {attempt} without a rate limit error: {message}"
                    ))
                });
            }
            Err(err) if err.is_auth_failure() => return Err(err.into()),
            Err(err) => debug!(attempt, error = %err, "Probe request rejected"),
            Ok(handle) => debug!(attempt, task_id = %handle.id, "Probe request accepted"),
        }
    }

    Ok(ScenarioVerdict::fail(format!(
        "no 429 within {RATE_LIMIT_PROBE_REQUESTS} requests"
    )))
}

/// `{"error": "..."}` bodies are checked on their `error` field, anything else as text
fn mentions_rate_limit(body: &str) -> bool {
    let text = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string());
    text.to_lowercase().contains("rate limit")
}
