//! # Concurrency Driver
//!
//! Runs `count` independent invocations under a worker budget and collects
//! exactly one [`Outcome`] per invocation.
//!
//! ```text
//! factory(i) → spawn → [Semaphore] → invocation (panic-caught) → completion channel
//!                          │                                           │
//!                          └─→ at most `worker_budget` in flight       └─→ joined after all senders drop
//! ```
//!
//! The completion channel is the only state shared between invocations. An
//! error or panic inside one invocation becomes that invocation's
//! `TransportError`; siblings and the join are unaffected. Results arrive in
//! completion order, each tagged with its invocation index.

use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info};

use crate::error::HarnessResult;
use crate::models::Outcome;

/// One invocation's verdict, attributable to its index
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    pub index: usize,
    pub outcome: Outcome,
}

/// Bounded-parallelism runner for submit-and-poll invocations
#[derive(Debug, Clone)]
pub struct ConcurrencyDriver {
    worker_budget: usize,
}

impl ConcurrencyDriver {
    /// A budget of zero is treated as one; budgets above the semaphore limit are capped
    pub fn new(worker_budget: usize) -> Self {
        Self {
            worker_budget: worker_budget.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    pub fn worker_budget(&self) -> usize {
        self.worker_budget
    }

    /// Run `count` invocations built by `factory` and wait for all of them
    ///
    /// The factory receives the invocation index. Invocation futures start
    /// running only once they hold a worker permit. A factory that panics
    /// fails only the invocation it was building.
    pub async fn run<F, Fut>(&self, count: usize, factory: F) -> Vec<InvocationOutcome>
    where
        F: Fn(usize) -> Fut,
        Fut: Future<Output = HarnessResult<Outcome>> + Send + 'static,
    {
        if count == 0 {
            return Vec::new();
        }

        info!(
            count,
            worker_budget = self.worker_budget,
            "Starting concurrent invocations"
        );

        let semaphore = Arc::new(Semaphore::new(self.worker_budget));
        // Permits are released before reporting, so blocked senders never hold the budget
        let capacity = count.min(self.worker_budget.saturating_mul(2));
        let (sender, mut receiver) = mpsc::channel::<InvocationOutcome>(capacity);

        for index in 0..count {
            let built = std::panic::catch_unwind(AssertUnwindSafe(|| factory(index)));
            let semaphore = semaphore.clone();
            let sender = sender.clone();

            tokio::spawn(async move {
                let outcome = match built {
                    Err(panic) => {
                        let reason =
                            format!("invocation panicked: {}", panic_message(panic.as_ref()));
                        error!(invocation = index, reason = %reason, "Invocation factory panicked");
                        Outcome::transport_error(reason, Duration::ZERO)
                    }
                    Ok(invocation) => match semaphore.acquire_owned().await {
                        Ok(permit) => {
                            let outcome = Self::execute(index, invocation).await;
                            drop(permit);
                            outcome
                        }
                        Err(_) => {
                            error!(
                                invocation = index,
                                "Worker budget closed before invocation could start"
                            );
                            Outcome::transport_error("worker budget closed", Duration::ZERO)
                        }
                    },
                };

                let reported = sender.send(InvocationOutcome { index, outcome }).await;
                if reported.is_err() {
                    error!(invocation = index, "Completion channel closed; outcome dropped");
                }
            });
        }

        // The channel closes once every spawned invocation has dropped its sender
        drop(sender);

        let mut results = Vec::with_capacity(count);
        while let Some(result) = receiver.recv().await {
            debug!(
                invocation = result.index,
                kind = ?result.outcome.kind(),
                "Invocation reported"
            );
            results.push(result);
        }

        Self::fill_missing(count, &mut results);

        info!(
            count,
            succeeded = results.iter().filter(|r| r.outcome.is_success()).count(),
            "Concurrent invocations completed"
        );

        results
    }

    async fn execute<Fut>(index: usize, invocation: Fut) -> Outcome
    where
        Fut: Future<Output = HarnessResult<Outcome>> + Send,
    {
        let started = Instant::now();
        match AssertUnwindSafe(invocation).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => {
                debug!(invocation = index, error = %err, "Invocation returned an error");
                Outcome::transport_error(err.to_string(), started.elapsed())
            }
            Err(panic) => {
                let reason = format!("invocation panicked: {}", panic_message(panic.as_ref()));
                error!(invocation = index, reason = %reason, "Invocation panicked");
                Outcome::transport_error(reason, started.elapsed())
            }
        }
    }

    /// Account for invocations whose task died without reporting (runtime shutdown, abort)
    fn fill_missing(count: usize, results: &mut Vec<InvocationOutcome>) {
        if results.len() == count {
            return;
        }

        let reported: HashSet<usize> = results.iter().map(|r| r.index).collect();
        for index in (0..count).filter(|i| !reported.contains(i)) {
            error!(invocation = index, "Invocation never reported an outcome");
            results.push(InvocationOutcome {
                index,
                outcome: Outcome::transport_error("invocation did not report", Duration::ZERO),
            });
        }
    }
}

/// Text of a caught panic payload
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
