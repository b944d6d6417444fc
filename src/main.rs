//! SAIREN-LAG - bottoms-up lag calculator and live sample tracker
//!
//! # Usage
//!
//! ```bash
//! # One-off calculation from a request file (TOML or JSON)
//! sairen-lag calc --request well_a.toml
//!
//! # Same, reading a JSON request from stdin
//! cat request.json | sairen-lag calc --json
//!
//! # HTTP API + tracker tick driver until Ctrl+C
//! sairen-lag serve --addr 0.0.0.0:8080
//! ```
//!
//! # Environment Variables
//!
//! - `SAIREN_LAG_CONFIG`: Path to lag_config.toml
//! - `SAIREN_LAG_SERVER_ADDR`: Override the server bind address
//! - `SAIREN_LAG_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sairen_lag::api::{create_app, AppState};
use sairen_lag::storage::{HistorySink, HistoryStorage};
use sairen_lag::tracker::{run_tick_driver, SampleTracker};
use sairen_lag::{LagConfig, LagPipeline, LagReport, LagRequest};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "sairen-lag")]
#[command(about = "Bottoms-up lag time calculator and live sample tracker")]
#[command(version)]
struct CliArgs {
    /// Path to lag_config.toml (default: $SAIREN_LAG_CONFIG, then ./lag_config.toml)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute one bottoms-up report and print it
    Calc {
        /// Request file (.toml or .json). Reads JSON from stdin when omitted.
        #[arg(short, long, value_name = "PATH")]
        request: Option<PathBuf>,

        /// Print the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Run the HTTP API and the tracker tick driver
    Serve {
        /// Override the server address (default: server.addr from config)
        #[arg(short, long, env = "SAIREN_LAG_SERVER_ADDR", value_name = "HOST:PORT")]
        addr: Option<String>,
    },
}

// ============================================================================
// Setup helpers
// ============================================================================

fn load_config(path: Option<&Path>) -> Result<LagConfig> {
    match path {
        Some(p) => LagConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(LagConfig::load()),
    }
}

fn load_request(path: Option<&Path>) -> Result<LagRequest> {
    match path {
        Some(p) => {
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("Failed to read request file {}", p.display()))?;
            if p.extension().is_some_and(|e| e == "toml") {
                toml::from_str(&contents).with_context(|| format!("Invalid TOML request in {}", p.display()))
            } else {
                serde_json::from_str(&contents).with_context(|| format!("Invalid JSON request in {}", p.display()))
            }
        }
        None => {
            let mut contents = String::new();
            std::io::stdin()
                .read_to_string(&mut contents)
                .context("Failed to read request from stdin")?;
            serde_json::from_str(&contents).context("Invalid JSON request on stdin")
        }
    }
}

/// Open the configured history store, pruning rows past retention.
///
/// A store that cannot be opened disables history rather than the server.
fn open_history(config: &LagConfig) -> Option<Arc<dyn HistorySink>> {
    if !config.history.enabled {
        info!("Calculation history disabled");
        return None;
    }
    match HistoryStorage::open(&config.history.path) {
        Ok(storage) => {
            if let Err(e) = storage.prune_older_than_days(config.history.retention_days) {
                warn!(error = %e, "History retention pruning failed");
            }
            Some(Arc::new(storage))
        }
        Err(e) => {
            warn!(path = %config.history.path, error = %e, "Failed to open history storage, continuing without it");
            None
        }
    }
}

fn print_summary(report: &LagReport) {
    println!("Segments:");
    for segment in &report.segments {
        println!(
            "  {:<22} {:>8.1} ft  {:>10.3} bbl",
            segment.kind.display_name(),
            segment.length_ft,
            report.volumes.segment(segment.kind)
        );
    }
    println!("Total annular volume: {:.3} bbl", report.volumes.total_bbl);
    println!(
        "Slippage: {} / {} = {:.3} ({})",
        report.slippage_table,
        report.mud_category,
        report.slippage_factor,
        report.efficiency.message()
    );
    println!(
        "Pump output: {:.3} bbl/min (effective {:.3})",
        report.circulation.pump_output_bbl_min, report.circulation.effective_output_bbl_min
    );
    println!(
        "Lag time: {:.2} min ({:.0} s, {:.0} strokes)",
        report.lag_time_minutes(),
        report.lag_time_seconds(),
        report.circulation.strokes_to_surface
    );
    for w in &report.warnings {
        println!("WARNING: {w}");
    }
}

// ============================================================================
// Commands
// ============================================================================

fn run_calc(config: LagConfig, request: Option<&Path>, json: bool) -> Result<()> {
    let request = load_request(request)?;
    let pipeline = match open_history(&config) {
        Some(sink) => LagPipeline::new(config).with_sink(sink),
        None => LagPipeline::new(config),
    };
    let report = pipeline.run(&request).context("Lag calculation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

async fn run_serve(config: LagConfig, addr: Option<String>) -> Result<()> {
    let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());
    let tick_interval = Duration::from_millis(config.tracker.tick_interval_ms);

    let tracker = Arc::new(SampleTracker::with_system_clock(config.tracker.clone()));
    let history = open_history(&config);
    let state = AppState::new(config, Arc::clone(&tracker), history);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind {server_addr}"))?;
    info!(addr = %server_addr, "HTTP API listening on /api/v1");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut tasks: JoinSet<Result<&'static str>> = JoinSet::new();

    let driver_token = cancel_token.clone();
    tasks.spawn(async move {
        run_tick_driver(tracker, tick_interval, driver_token).await;
        Ok::<_, anyhow::Error>("TickDriver")
    });

    let server_token = cancel_token.clone();
    tasks.spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await
            .context("HTTP server error")?;
        Ok::<_, anyhow::Error>("HttpServer")
    });

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(name)) => info!(task = name, "Task finished"),
            Ok(Err(e)) => {
                error!(error = %e, "Task failed, shutting down");
                cancel_token.cancel();
            }
            Err(e) => {
                error!(error = %e, "Task panicked, shutting down");
                cancel_token.cancel();
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Calc { request, json } => run_calc(config, request.as_deref(), json),
        Command::Serve { addr } => {
            run_serve(config, addr).await?;
            info!("SAIREN-LAG shutdown complete");
            Ok(())
        }
    }
}
