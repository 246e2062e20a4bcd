#![allow(clippy::doc_markdown)] // Allow technical terms like reqwest, RPS in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # taskprobe
//!
//! Verification and load-test harness for an asynchronous task service that
//! accepts work over HTTP (`POST /v1/{kind}`), hands back a task id, and is
//! polled (`GET /v1/{kind}/{id}`) until the task reaches a terminal status.
//!
//! ## Overview
//!
//! Every submitted task is turned into exactly one [`Outcome`](models::Outcome)
//! by a bounded poll loop. Outcomes are produced either one scenario at a time
//! (functional verification) or many at once under a worker budget (load
//! testing), and are reduced into [`AggregateStats`](metrics::AggregateStats).
//!
//! ## Module Organization
//!
//! - [`client`] - [`TaskApi`](client::TaskApi) seam and its reqwest implementation
//! - [`poller`] - Per-task poll loop producing one outcome
//! - [`driver`] - Bounded-parallelism invocation runner
//! - [`scenario`] - Sequential scenario runner and the standard scenario catalog
//! - [`load_test`] - Driver + poller + aggregator wired into one run
//! - [`metrics`] - Outcome aggregation (success rate, avg/max/p95/p99 latency)
//! - [`models`] - Requests, statuses, snapshots and outcomes
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use taskprobe::client::TaskApiClient;
//! use taskprobe::config::HarnessConfig;
//! use taskprobe::load_test::{run_load_test, LoadTestPlan};
//! use taskprobe::models::{ScrapeRequest, TaskEndpoint};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::load()?;
//! let client = Arc::new(TaskApiClient::from_config(&config.api)?);
//!
//! let mut plan = LoadTestPlan::from_config(&config)?;
//! plan.endpoint = TaskEndpoint::Scrape;
//! plan.count = 20;
//!
//! let report = run_load_test(client, &plan, |_| {
//!     ScrapeRequest::new("https://httpbin.org/html").into()
//! })
//! .await;
//! println!("{}", report.stats);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod load_test;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod poller;
pub mod scenario;

pub use client::{TaskApi, TaskApiClient, TaskApiConfig};
pub use config::HarnessConfig;
pub use driver::{ConcurrencyDriver, InvocationOutcome};
pub use error::{HarnessError, HarnessResult};
pub use load_test::{run_load_test, LoadTestPlan, LoadTestReport};
pub use metrics::{summarize, summarize_with, AggregateStats, SummaryOptions};
pub use models::{Outcome, OutcomeKind, StatusKind, StatusSnapshot, TaskEndpoint, TaskHandle};
pub use poller::{CompletionPoller, PollerConfig};
pub use scenario::{Scenario, ScenarioContext, ScenarioReport, ScenarioResult, ScenarioRunner};
