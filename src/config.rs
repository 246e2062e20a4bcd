//! # Harness Configuration
//!
//! Layered configuration for the harness: built-in defaults, then optional
//! TOML files, then `TASKPROBE__SECTION__KEY` environment variables.
//!
//! ```rust
//! use taskprobe::config::HarnessConfig;
//!
//! let config = HarnessConfig::default();
//! assert_eq!(config.api.base_url, "http://localhost:3000");
//! assert_eq!(config.polling.max_attempts, 30);
//! ```

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};
use crate::metrics::{CancelledPolicy, LatencyBasis, SummaryOptions};
use crate::models::TaskEndpoint;
use crate::poller::PollerConfig;

/// Prefix for environment overrides, e.g. `TASKPROBE__API__BASE_URL`
pub const ENV_PREFIX: &str = "TASKPROBE";

/// Selects `config/taskprobe.<env>.toml`
pub const ENV_SELECTOR: &str = "TASKPROBE_ENV";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    pub api: ApiConfig,
    pub polling: PollingConfig,
    pub load: LoadConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the remote task service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:3000`. Endpoint paths are appended.
    pub base_url: String,
    /// Bearer credential sent on every request
    pub api_key: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
    /// Optional wall-clock budget per task, on top of the attempt budget
    #[serde(default)]
    pub max_wait_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Endpoint short name (`scrape`, `crawl`, `search`, `extract`)
    pub endpoint: String,
    /// Target URL placed in generated payloads
    pub target_url: String,
    /// Number of invocations
    pub concurrency: usize,
    /// Maximum invocations in flight at once
    pub worker_budget: usize,
    pub cancelled_counts_as_success: bool,
    pub successes_only_latency: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Directory for JSON log files; console only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:3000".to_string(),
                api_key: String::new(),
                request_timeout_ms: 30_000,
            },
            polling: PollingConfig {
                interval_ms: 2_000,
                max_attempts: 30,
                max_wait_ms: None,
            },
            load: LoadConfig {
                endpoint: "crawl".to_string(),
                target_url: "https://httpbin.org/html".to_string(),
                concurrency: 5,
                worker_budget: 5,
                cancelled_counts_as_success: false,
                successes_only_latency: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                log_dir: None,
            },
        }
    }
}

impl HarnessConfig {
    /// Load configuration with environment auto-detection
    ///
    /// Precedence (highest to lowest):
    /// 1. `TASKPROBE__*` environment variables
    /// 2. `config/taskprobe.<TASKPROBE_ENV>.toml`
    /// 3. `config/taskprobe.toml`
    /// 4. Default values
    pub fn load() -> HarnessResult<Self> {
        let environment =
            std::env::var(ENV_SELECTOR).unwrap_or_else(|_| "development".to_string());

        let builder = Self::defaults_builder()?
            .add_source(File::with_name("config/taskprobe").required(false))
            .add_source(
                File::with_name(&format!("config/taskprobe.{environment}")).required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            environment = %environment,
            base_url = %config.api.base_url,
            "Loaded harness configuration"
        );
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment overrides
    pub fn load_from_file(path: &Path) -> HarnessResult<Self> {
        if !path.is_file() {
            return Err(HarnessError::config_error(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let builder = Self::defaults_builder()?
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(path = %path.display(), "Loaded harness configuration from file");
        Ok(config)
    }

    fn defaults_builder() -> HarnessResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = Self::default();
        let builder = Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.api_key", defaults.api.api_key)?
            .set_default("api.request_timeout_ms", defaults.api.request_timeout_ms as i64)?
            .set_default("polling.interval_ms", defaults.polling.interval_ms as i64)?
            .set_default("polling.max_attempts", i64::from(defaults.polling.max_attempts))?
            .set_default("load.endpoint", defaults.load.endpoint)?
            .set_default("load.target_url", defaults.load.target_url)?
            .set_default("load.concurrency", defaults.load.concurrency as i64)?
            .set_default("load.worker_budget", defaults.load.worker_budget as i64)?
            .set_default(
                "load.cancelled_counts_as_success",
                defaults.load.cancelled_counts_as_success,
            )?
            .set_default(
                "load.successes_only_latency",
                defaults.load.successes_only_latency,
            )?
            .set_default("logging.level", defaults.logging.level)?;
        Ok(builder)
    }

    /// Reject values the harness cannot run with
    pub fn validate(&self) -> HarnessResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(HarnessError::config_error("api.base_url must not be empty"));
        }
        reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            HarnessError::config_error(format!("api.base_url is not a valid URL: {e}"))
        })?;
        if self.polling.interval_ms == 0 {
            return Err(HarnessError::config_error("polling.interval_ms must be positive"));
        }
        if self.polling.max_attempts == 0 {
            return Err(HarnessError::config_error("polling.max_attempts must be positive"));
        }
        if self.load.worker_budget == 0 {
            return Err(HarnessError::config_error("load.worker_budget must be positive"));
        }
        self.load.endpoint.parse::<TaskEndpoint>()?;
        Ok(())
    }

    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            poll_interval: Duration::from_millis(self.polling.interval_ms),
            max_attempts: self.polling.max_attempts,
            max_wait: self.polling.max_wait_ms.map(Duration::from_millis),
        }
    }

    pub fn summary_options(&self) -> SummaryOptions {
        SummaryOptions {
            cancelled: if self.load.cancelled_counts_as_success {
                CancelledPolicy::AsSuccess
            } else {
                CancelledPolicy::AsFailure
            },
            latency_basis: if self.load.successes_only_latency {
                LatencyBasis::SuccessesOnly
            } else {
                LatencyBasis::AllOutcomes
            },
        }
    }

    pub fn load_endpoint(&self) -> HarnessResult<TaskEndpoint> {
        self.load.endpoint.parse()
    }
}
