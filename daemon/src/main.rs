//! Governance sentinel: one pass per invocation, meant to be run from cron.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use sentinel_agent::{AgentError, RunOutcome, RunSettings, Sentinel, SentinelConfig, ShutdownController};
use sentinel_rpc::RpcClient;
use sentinel_store_lmdb::LmdbStore;
use sentinel_types::SystemClock;
use sentinel_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "sentinel", version, about = "Masternode governance sentinel")]
struct Cli {
    /// Path to a TOML configuration file. Without one, built-in defaults
    /// are used and RPC settings come from the daemon's own config file.
    #[arg(long, env = "SENTINEL_CONFIG")]
    config: Option<PathBuf>,

    /// Run a pass now, ignoring the schedule and the start delay.
    #[arg(short = 'b', long)]
    bypass_scheduler: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SENTINEL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SENTINEL_LOG_FORMAT")]
    log_format: Option<LogFormat>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match SentinelConfig::from_toml_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("sentinel: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SentinelConfig::default(),
    };

    let level = if std::env::var_os("SENTINEL_DEBUG").is_some_and(|v| !v.is_empty()) {
        "debug".to_string()
    } else {
        cli.log_level.clone().unwrap_or_else(|| config.log_level.clone())
    };
    init_logging(cli.log_format.unwrap_or(config.log_format), &level);

    match run(&cli, &config) {
        Ok(outcome) => {
            tracing::debug!(?outcome, "sentinel exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, config: &SentinelConfig) -> anyhow::Result<RunOutcome> {
    let (network, creds) = config.resolve_daemon()?;
    tracing::debug!(network = network.as_str(), ?creds, "daemon resolved");

    let daemon = RpcClient::new(&creds)?;
    let store = LmdbStore::open(&config.data_dir)
        .with_context(|| format!("opening store at {}", config.data_dir.display()))?;
    let settings = RunSettings::from_config(config, network, cli.bypass_scheduler);
    let sentinel = Sentinel::new(daemon, store, SystemClock, settings);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let controller = ShutdownController::new();
    let mut rng = StdRng::from_entropy();
    let outcome = runtime.block_on(async {
        let signals = async {
            controller.wait_for_signal().await;
            std::future::pending::<()>().await
        };
        tokio::select! {
            outcome = sentinel.run_until_shutdown(&mut rng, controller.subscribe()) => outcome,
            () = signals => Err(AgentError::Interrupted),
        }
    })?;
    Ok(outcome)
}
