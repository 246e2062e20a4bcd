use proptest::prelude::*;
use std::time::Duration;
use taskprobe::models::{Outcome, StatusKind, StatusSnapshot};

/// Strategy for generating latencies between 0 and 60s, in microseconds
pub fn latency_strategy() -> impl Strategy<Value = Duration> {
    (0u64..60_000_000).prop_map(Duration::from_micros)
}

/// Strategy for generating outcomes of every kind
pub fn outcome_strategy() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        latency_strategy().prop_map(|latency| Outcome::Success {
            snapshot: StatusSnapshot::with_status(StatusKind::Completed),
            latency,
        }),
        latency_strategy().prop_map(|latency| Outcome::Failure {
            reason: "failed".to_string(),
            latency,
        }),
        latency_strategy().prop_map(|latency| Outcome::Cancelled {
            snapshot: StatusSnapshot::with_status(StatusKind::Cancelled),
            latency,
        }),
        (latency_strategy(), 1u32..40)
            .prop_map(|(latency, attempts)| Outcome::TimedOut { latency, attempts }),
        latency_strategy().prop_map(|latency| Outcome::transport_error("refused", latency)),
    ]
}

/// Strategy for generating outcome batches, including empty ones
pub fn outcomes_strategy() -> impl Strategy<Value = Vec<Outcome>> {
    prop::collection::vec(outcome_strategy(), 0..200)
}
