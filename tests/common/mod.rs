#![allow(dead_code)]

pub mod mock_task_api;
pub mod strategies;

pub use mock_task_api::*;

use std::sync::Arc;
use std::time::{Duration, Instant};
use taskprobe::client::TaskApi;
use taskprobe::config::HarnessConfig;
use taskprobe::models::{TaskEndpoint, TaskHandle};
use taskprobe::poller::{CompletionPoller, PollerConfig};
use taskprobe::scenario::ScenarioContext;

/// Poll budget small enough for tests: 1ms interval
pub fn fast_poller(max_attempts: u32) -> CompletionPoller {
    CompletionPoller::new(PollerConfig {
        poll_interval: Duration::from_millis(1),
        max_attempts,
        max_wait: None,
    })
}

pub fn handle(id: &str) -> TaskHandle {
    TaskHandle::new(id, TaskEndpoint::Scrape, Instant::now())
}

pub fn scenario_context(client: Arc<dyn TaskApi>) -> ScenarioContext {
    let mut config = HarnessConfig::default();
    config.polling.interval_ms = 1;
    config.polling.max_attempts = 5;
    ScenarioContext {
        client,
        poller: CompletionPoller::new(config.poller_config()),
        config: Arc::new(config),
    }
}
