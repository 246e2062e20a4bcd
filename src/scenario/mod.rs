//! # Scenario Runner
//!
//! Sequences named submit → poll → assert scenarios. Scenarios run strictly
//! one after another so that noisy ones (rate limiting) cannot disturb the
//! rest. An error or panic inside a scenario fails that scenario only.

pub mod catalog;

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::client::TaskApi;
use crate::config::HarnessConfig;
use crate::driver::panic_message;
use crate::poller::CompletionPoller;

/// Everything a scenario closure may use
#[derive(Clone)]
pub struct ScenarioContext {
    pub client: Arc<dyn TaskApi>,
    pub poller: CompletionPoller,
    pub config: Arc<HarnessConfig>,
}

impl fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("poller", &self.poller)
            .field("base_url", &self.config.api.base_url)
            .finish()
    }
}

/// Assertion result returned by a scenario that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioVerdict {
    pub passed: bool,
    pub detail: String,
}

impl ScenarioVerdict {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            passed: true,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            passed: false,
            detail: detail.into(),
        }
    }
}

pub type ScenarioFn =
    Box<dyn FnOnce(ScenarioContext) -> BoxFuture<'static, anyhow::Result<ScenarioVerdict>> + Send>;

/// A named scenario
pub struct Scenario {
    pub name: String,
    run: ScenarioFn,
}

impl Scenario {
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: FnOnce(ScenarioContext) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = anyhow::Result<ScenarioVerdict>> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(move |ctx| run(ctx).boxed()),
        }
    }
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario").field("name", &self.name).finish()
    }
}

/// Result of one scenario execution
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
    pub duration: Duration,
}

/// Ordered results of a scenario run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioReport {
    pub results: Vec<ScenarioResult>,
}

impl ScenarioReport {
    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// The run succeeds only if every scenario passed
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        let passed = self.passed();
        writeln!(f, "Scenarios: {passed}/{total} passed")?;
        if total > 0 {
            writeln!(f, "Pass rate: {:.1}%", passed as f64 * 100.0 / total as f64)?;
        }
        for result in &self.results {
            let mark = if result.passed { "PASS" } else { "FAIL" };
            writeln!(
                f,
                "  [{mark}] {} ({:.2}s) {}",
                result.name,
                result.duration.as_secs_f64(),
                result.detail
            )?;
        }
        Ok(())
    }
}

/// Sequential scenario executor
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    context: ScenarioContext,
}

impl ScenarioRunner {
    pub fn new(context: ScenarioContext) -> Self {
        Self { context }
    }

    /// Run every scenario in order, one at a time
    pub async fn run_all(&self, scenarios: Vec<Scenario>) -> ScenarioReport {
        let mut report = ScenarioReport {
            results: Vec::with_capacity(scenarios.len()),
        };

        for scenario in scenarios {
            let result = self.run_one(scenario).await;
            report.results.push(result);
        }

        info!(
            passed = report.passed(),
            total = report.total(),
            "Scenario run finished"
        );
        report
    }

    async fn run_one(&self, scenario: Scenario) -> ScenarioResult {
        let Scenario { name, run } = scenario;
        info!(scenario = %name, "Running scenario");

        let started = Instant::now();
        let context = self.context.clone();
        let attempt = AssertUnwindSafe(async move { run(context).await }).catch_unwind();
        let (passed, detail) = match attempt.await {
            Ok(Ok(verdict)) => (verdict.passed, verdict.detail),
            Ok(Err(err)) => (false, format!("error: {err:#}")),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(scenario = %name, panic = %message, "Scenario panicked");
                (false, format!("panicked: {message}"))
            }
        };
        let duration = started.elapsed();

        let duration_ms = duration.as_millis() as u64;
        if passed {
            info!(scenario = %name, duration_ms, detail = %detail, "Scenario passed");
        } else {
            warn!(scenario = %name, duration_ms, detail = %detail, "Scenario failed");
        }

        ScenarioResult {
            name,
            passed,
            detail,
            duration,
        }
    }
}
