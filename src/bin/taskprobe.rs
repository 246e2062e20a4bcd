//! # taskprobe
//!
//! Command-line front end: health pre-flight, the scenario suite, and load runs
//! against a task service.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use taskprobe::client::{TaskApi, TaskApiClient};
use taskprobe::config::HarnessConfig;
use taskprobe::load_test::{default_payload, run_load_test, LoadTestPlan};
use taskprobe::logging::init_structured_logging;
use taskprobe::models::TaskEndpoint;
use taskprobe::poller::CompletionPoller;
use taskprobe::scenario::catalog::standard_scenarios;
use taskprobe::scenario::{ScenarioContext, ScenarioRunner};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "taskprobe")]
#[command(about = "Verify and load-test an asynchronous task service")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (default: config/taskprobe.toml plus TASKPROBE_ENV overlay)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the service base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Skip the health pre-flight
    #[arg(long)]
    skip_health: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the service answers its health endpoint
    Health,

    /// Run the standard scenario suite sequentially
    Scenarios {
        /// Only run scenarios whose name contains one of these fragments
        #[arg(long)]
        only: Vec<String>,
    },

    /// Submit many tasks at once and report aggregate latency
    Load {
        /// Endpoint to load (scrape, crawl, search, extract)
        #[arg(short, long)]
        endpoint: Option<TaskEndpoint>,

        /// Number of invocations
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Maximum invocations in flight
        #[arg(short, long)]
        workers: Option<usize>,

        /// Target URL placed in generated payloads
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("taskprobe: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    init_structured_logging(&config.logging);

    match run(cli, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %format!("{e:#}"), "taskprobe aborted");
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<HarnessConfig> {
    let mut config = match &cli.config {
        Some(path) => HarnessConfig::load_from_file(path)?,
        None => HarnessConfig::load()?,
    };
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
        config.validate()?;
    }
    Ok(config)
}

/// Returns whether the selected run passed
async fn run(cli: Cli, config: HarnessConfig) -> anyhow::Result<bool> {
    let client = Arc::new(TaskApiClient::from_config(&config.api)?);

    if !cli.skip_health || matches!(cli.command, Commands::Health) {
        let healthy = client.health_check().await;
        println!(
            "Health check {}: {}",
            client.base_url(),
            if healthy { "ok" } else { "FAILED" }
        );
        if !healthy || matches!(cli.command, Commands::Health) {
            return Ok(healthy);
        }
    }

    match cli.command {
        Commands::Health => Ok(true),
        Commands::Scenarios { only } => {
            let scenarios: Vec<_> = standard_scenarios()
                .into_iter()
                .filter(|s| only.is_empty() || only.iter().any(|f| s.name.contains(f.as_str())))
                .collect();
            info!(count = scenarios.len(), "Running scenario suite");

            let runner = ScenarioRunner::new(ScenarioContext {
                client,
                poller: CompletionPoller::new(config.poller_config()),
                config: Arc::new(config),
            });
            let report = runner.run_all(scenarios).await;
            print!("{report}");
            Ok(report.all_passed())
        }
        Commands::Load {
            endpoint,
            count,
            workers,
            url,
        } => {
            let mut plan = LoadTestPlan::from_config(&config)?;
            if let Some(endpoint) = endpoint {
                plan.endpoint = endpoint;
            }
            if let Some(count) = count {
                plan.count = count;
            }
            if let Some(workers) = workers {
                plan.worker_budget = workers;
            }
            let target_url = url.unwrap_or_else(|| config.load.target_url.clone());
            let endpoint = plan.endpoint;

            let report = run_load_test(client, &plan, |index| {
                default_payload(endpoint, &target_url, index)
            })
            .await;

            println!("Run {} against {}", report.run_id, endpoint);
            println!("Wall time:    {:.2}s", report.wall_time.as_secs_f64());
            println!("Throughput:   {:.2} tasks/s", report.throughput_rps);
            println!("{}", report.stats);
            for failure in report.failures() {
                println!("  task {}: {}", failure.index, failure.outcome);
            }
            Ok(report.passed())
        }
    }
}
