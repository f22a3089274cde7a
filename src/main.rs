//! StockRunner - Main Entry Point
//!
//! Without a mode argument runs the polling session for the day. With one
//! (`percent` or `price`) performs a single retrieval and prints it.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use stock_runner::config::{load_config, resolve_home};
use stock_runner::engine::{retrieve_once, supervise, Session, SessionState, ThreadRandom};
use stock_runner::{Mode, ProviderKind, RunnerPaths};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Runner home folder (defaults to ~/.stock)
    #[arg(long, env = "STOCK_RUNNER_HOME")]
    home: Option<PathBuf>,

    /// Path to configuration file (defaults to <home>/cfg/stock.cfg.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG directives take precedence
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Provider to use for a single retrieval (east, qq, sina, xq, cls, sohu)
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// Retrieve once in this mode (percent or price), print and exit
    mode: Option<Mode>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let home = resolve_home(args.home.clone())?;
    let mut paths = RunnerPaths::under(&home);
    if let Some(config) = &args.config {
        paths = paths.with_config_file(config);
    }

    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &args.log_level);

    match args.mode {
        Some(mode) => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;

            probe(&paths, args.provider, mode).await
        }
        None => {
            fs::create_dir_all(&paths.home)
                .with_context(|| format!("cannot create {}", paths.home.display()))?;
            let log = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&paths.log_file)
                .with_context(|| format!("cannot open {}", paths.log_file.display()))?;

            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false)
                .with_writer(Mutex::new(log))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;

            run_session(paths).await
        }
    }
}

/// `RUST_LOG` directives when set and valid, else the `--log-level` value, else `info`
fn log_filter(directives: Option<String>, level: &str) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .or_else(|| EnvFilter::try_new(level.to_lowercase()).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// One retrieval, printed as the snapshot `prices` JSON
async fn probe(paths: &RunnerPaths, provider: Option<ProviderKind>, mode: Mode) -> Result<()> {
    let config = load_config(&paths.config_file)
        .with_context(|| format!("invalid configuration {}", paths.config_file.display()))?;
    let state = SessionState::resolve(config)?;

    let prices = retrieve_once(&state, provider, mode, &mut ThreadRandom).await?;
    println!("{}", serde_json::to_string_pretty(&prices)?);
    Ok(())
}

async fn run_session(paths: RunnerPaths) -> Result<()> {
    info!("Starting StockRunner");
    info!("Configuration file: {}", paths.config_file.display());

    let session = match Session::configured(paths, Box::new(ThreadRandom)) {
        Ok(session) => session,
        Err(e) => {
            error!("Cannot start without a valid configuration: {}", e);
            return Err(e.into());
        }
    };

    let notifier = session.notifier();
    let exit = supervise(session.run(), notifier).await?;
    info!("Session finished: {:?}", exit);
    Ok(())
}
