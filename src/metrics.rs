//! # Metrics Aggregator
//!
//! Reduces a finite sequence of [`Outcome`]s into [`AggregateStats`].
//!
//! Statistics are recomputed from scratch on every call; nothing is
//! accumulated between calls, so summarizing the same outcomes twice always
//! yields identical results regardless of the order they were collected in.
//!
//! Percentiles use the nearest-rank method on ascending latencies: the p95
//! index is `floor(0.95 * n)`, clamped to the last element.
//!
//! By default latency statistics cover every outcome (failed, timed-out and
//! transport-error invocations included) and `cancelled` counts as a failure.
//! Both are explicit choices in [`SummaryOptions`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Outcome, OutcomeKind};

/// How a confirmed cancellation is counted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelledPolicy {
    AsSuccess,
    #[default]
    AsFailure,
}

/// Which outcomes contribute latencies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyBasis {
    #[default]
    AllOutcomes,
    SuccessesOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryOptions {
    pub cancelled: CancelledPolicy,
    pub latency_basis: LatencyBasis,
}

impl SummaryOptions {
    fn counts_as_success(&self, outcome: &Outcome) -> bool {
        match outcome.kind() {
            OutcomeKind::Success => true,
            OutcomeKind::Cancelled => self.cancelled == CancelledPolicy::AsSuccess,
            _ => false,
        }
    }
}

/// Per-kind outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeBreakdown {
    pub success: usize,
    pub failure: usize,
    pub cancelled: usize,
    pub timed_out: usize,
    pub transport_error: usize,
}

impl OutcomeBreakdown {
    fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Success => self.success += 1,
            OutcomeKind::Failure => self.failure += 1,
            OutcomeKind::Cancelled => self.cancelled += 1,
            OutcomeKind::TimedOut => self.timed_out += 1,
            OutcomeKind::TransportError => self.transport_error += 1,
        }
    }
}

/// Summary of one run; `succeeded + failed == total` always holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// `succeeded / total`, 0.0 for an empty run
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    pub max_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub breakdown: OutcomeBreakdown,
}

impl AggregateStats {
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Summarize outcomes with the default options
pub fn summarize(outcomes: &[Outcome]) -> AggregateStats {
    summarize_with(outcomes, SummaryOptions::default())
}

/// Summarize outcomes under explicit counting and latency choices
pub fn summarize_with(outcomes: &[Outcome], options: SummaryOptions) -> AggregateStats {
    let total = outcomes.len();
    let mut breakdown = OutcomeBreakdown::default();
    let mut succeeded = 0;
    let mut latencies = Vec::with_capacity(total);

    for outcome in outcomes {
        breakdown.record(outcome.kind());
        let success = options.counts_as_success(outcome);
        if success {
            succeeded += 1;
        }
        if success || options.latency_basis == LatencyBasis::AllOutcomes {
            latencies.push(outcome.latency_ms());
        }
    }

    let latency = LatencyStats::from_latencies(latencies);

    AggregateStats {
        total,
        succeeded,
        failed: total - succeeded,
        success_rate: if total == 0 {
            0.0
        } else {
            succeeded as f64 / total as f64
        },
        avg_latency_ms: latency.avg,
        max_latency_ms: latency.max,
        p95_latency_ms: latency.p95,
        p99_latency_ms: latency.p99,
        breakdown,
    }
}

/// Latency distribution over raw millisecond samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyStats {
    pub avg: f64,
    pub max: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencyStats {
    pub fn from_latencies(mut latencies: Vec<f64>) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }

        latencies.sort_by(f64::total_cmp);

        let avg = latencies.iter().sum::<f64>() / latencies.len() as f64;
        let max = latencies[latencies.len() - 1];

        Self {
            avg,
            max,
            p95: nearest_rank(&latencies, 0.95),
            p99: nearest_rank(&latencies, 0.99),
        }
    }
}

/// Nearest-rank percentile over ascending data; 0.0 for empty input
pub fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64) * quantile).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total:        {}", self.total)?;
        writeln!(f, "Succeeded:    {}", self.succeeded)?;
        writeln!(f, "Failed:       {}", self.failed)?;
        writeln!(f, "Success rate: {:.1}%", self.success_rate * 100.0)?;
        writeln!(
            f,
            "  (failure {}, cancelled {}, timed out {}, transport {})",
            self.breakdown.failure,
            self.breakdown.cancelled,
            self.breakdown.timed_out,
            self.breakdown.transport_error
        )?;
        writeln!(f, "Avg latency:  {:.2}ms", self.avg_latency_ms)?;
        writeln!(f, "Max latency:  {:.2}ms", self.max_latency_ms)?;
        writeln!(f, "P95 latency:  {:.2}ms", self.p95_latency_ms)?;
        write!(f, "P99 latency:  {:.2}ms", self.p99_latency_ms)
    }
}
