//! # Load Test
//!
//! Wires the task client, the completion poller and the concurrency driver
//! into one submit-and-poll load run, then summarizes it.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

use crate::client::TaskApi;
use crate::config::HarnessConfig;
use crate::driver::{ConcurrencyDriver, InvocationOutcome};
use crate::error::HarnessResult;
use crate::logging::log_invocation_outcome;
use crate::metrics::{summarize_with, AggregateStats, SummaryOptions};
use crate::models::{
    CrawlRequest, ExtractRequest, Outcome, ScrapeRequest, SearchRequest, TaskEndpoint,
    TaskPayload,
};
use crate::poller::{CompletionPoller, PollerConfig};

/// What to run and how to judge it
#[derive(Debug, Clone)]
pub struct LoadTestPlan {
    pub endpoint: TaskEndpoint,
    /// Number of invocations
    pub count: usize,
    pub worker_budget: usize,
    pub poller: PollerConfig,
    pub summary: SummaryOptions,
}

impl LoadTestPlan {
    pub fn from_config(config: &HarnessConfig) -> HarnessResult<Self> {
        Ok(Self {
            endpoint: config.load_endpoint()?,
            count: config.load.concurrency,
            worker_budget: config.load.worker_budget,
            poller: config.poller_config(),
            summary: config.summary_options(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct LoadTestReport {
    pub run_id: Uuid,
    pub outcomes: Vec<InvocationOutcome>,
    pub stats: AggregateStats,
    pub wall_time: Duration,
    /// Invocations per second over the whole run
    pub throughput_rps: f64,
}

impl LoadTestReport {
    pub fn passed(&self) -> bool {
        self.stats.all_succeeded()
    }

    /// Non-successful invocations, ordered by index, for per-task diagnostics
    pub fn failures(&self) -> Vec<&InvocationOutcome> {
        let mut failures: Vec<_> = self
            .outcomes
            .iter()
            .filter(|r| !r.outcome.is_success())
            .collect();
        failures.sort_by_key(|r| r.index);
        failures
    }
}

/// Lightweight per-invocation payload for `endpoint`
///
/// Search queries carry the invocation index so that each submission is distinct.
pub fn default_payload(endpoint: TaskEndpoint, target_url: &str, index: usize) -> TaskPayload {
    match endpoint {
        TaskEndpoint::Scrape => ScrapeRequest::new(target_url)
            .with_rule("title", "title")
            .into(),
        TaskEndpoint::Crawl => CrawlRequest::new(target_url, 1, 10).into(),
        TaskEndpoint::Search => SearchRequest {
            query: format!("load test {index}"),
            sources: None,
            limit: Some(1),
        }
        .into(),
        TaskEndpoint::Extract => ExtractRequest {
            urls: vec![target_url.to_string()],
            prompt: Some("Extract the page title".to_string()),
        }
        .into(),
    }
}

/// Submit `plan.count` tasks and poll each to completion under the worker budget
///
/// `payload_factory` builds the submission body for each invocation index.
pub async fn run_load_test<C, P>(
    client: Arc<C>,
    plan: &LoadTestPlan,
    payload_factory: P,
) -> LoadTestReport
where
    C: TaskApi + ?Sized + 'static,
    P: Fn(usize) -> TaskPayload,
{
    let run_id = Uuid::new_v4();
    let poller = CompletionPoller::new(plan.poller);
    let endpoint = plan.endpoint;

    info!(
        run_id = %run_id,
        endpoint = %endpoint,
        count = plan.count,
        worker_budget = plan.worker_budget,
        "Starting load test"
    );

    let started = Instant::now();
    let outcomes = ConcurrencyDriver::new(plan.worker_budget)
        .run(plan.count, |index| {
            let client = client.clone();
            let payload = payload_factory(index);
            async move {
                let handle = client.create_task(endpoint, &payload).await?;
                let outcome = poller.poll(client.as_ref(), &handle).await;
                log_invocation_outcome(index, &outcome);
                Ok(outcome)
            }
        })
        .await;
    let wall_time = started.elapsed();

    let flat: Vec<Outcome> = outcomes.iter().map(|r| r.outcome.clone()).collect();
    let stats = summarize_with(&flat, plan.summary);
    let throughput_rps = if wall_time.is_zero() {
        0.0
    } else {
        stats.total as f64 / wall_time.as_secs_f64()
    };

    info!(
        run_id = %run_id,
        total = stats.total,
        succeeded = stats.succeeded,
        failed = stats.failed,
        p95_latency_ms = stats.p95_latency_ms,
        wall_time_ms = wall_time.as_millis() as u64,
        "Load test finished"
    );

    LoadTestReport {
        run_id,
        outcomes,
        stats,
        wall_time,
        throughput_rps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_from_default_config() {
        let plan = LoadTestPlan::from_config(&HarnessConfig::default()).unwrap();
        assert_eq!(plan.endpoint, TaskEndpoint::Crawl);
        assert_eq!(plan.count, 5);
        assert_eq!(plan.worker_budget, 5);
    }

    #[test]
    fn test_default_payload_matches_endpoint() {
        for endpoint in [
            TaskEndpoint::Scrape,
            TaskEndpoint::Crawl,
            TaskEndpoint::Search,
            TaskEndpoint::Extract,
        ] {
            let payload = default_payload(endpoint, "https://httpbin.org/html", 3);
            assert_eq!(payload.endpoint(), Some(endpoint));
        }

        let search = serde_json::to_value(default_payload(TaskEndpoint::Search, "", 7)).unwrap();
        assert_eq!(search["query"], "load test 7");
    }
}
