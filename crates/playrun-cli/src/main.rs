//! PlayRun command line driver.
//!
//! Plays a video a fixed number of times against the simulated provider and
//! reports progress as human-readable lines or JSON events.

mod config;
mod json_output;
mod render;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use playrun_core::{RunCount, SessionOutcome, ValidationError, VideoRef};
use playrun_player::Orchestrator;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;

/// Play a video repeatedly and report playback progress.
#[derive(Parser, Debug)]
#[command(name = "playrun", about = "Play a video a fixed number of times")]
struct Cli {
    /// Video URL (youtube.com/watch?v=... or youtu.be/...)
    url: String,

    /// Number of back-to-back runs (1-5)
    #[arg(short, long, default_value = "1")]
    runs: String,

    /// Output events as JSON lines on stdout
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Seconds to wait between runs
    #[arg(long, default_value = "2", value_parser = parse_seconds)]
    cooldown_secs: Duration,

    /// Progress sampling period in milliseconds
    #[arg(long, default_value = "500")]
    sample_ms: u64,

    /// Simulated video duration in seconds (0 for unknown)
    #[arg(long, default_value = "30")]
    sim_duration: f64,

    /// Simulated playback speed multiplier
    #[arg(long, default_value = "1")]
    sim_rate: f64,

    /// Simulated video title
    #[arg(long)]
    sim_title: Option<String>,

    /// Fail player creation with this provider error code
    #[arg(long)]
    sim_error: Option<i32>,

    /// Never load the simulated player library
    #[arg(long)]
    sim_no_api: bool,
}

const EXIT_FAILED: u8 = 1;
const EXIT_INVALID_INPUT: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.json {
        json_output::enable_json_mode();
    }

    // Logs go to stderr so stdout stays clean for output lines.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let (video, total_runs) = match validate(&cli) {
        Ok(input) => input,
        Err(e) => {
            if json_output::is_json_mode() {
                json_output::emit_validation_failed(&e);
            } else {
                eprintln!("Error: {}", e);
            }
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let config = Config::from_cli(&cli);
    let orchestrator =
        Orchestrator::new(Arc::new(config.provider())).with_config(config.session_config());

    info!(
        video = %video,
        runs = total_runs.get(),
        cooldown_ms = config.cooldown.as_millis() as u64,
        "Starting playback session"
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping session");
            ctrl_c.cancel();
        }
    });

    let mut session = orchestrator.spawn(video, total_runs, cancel);
    while let Some(event) = session.events.next().await {
        if json_output::is_json_mode() {
            json_output::emit_session_event(&event);
        } else if let Some(line) = render::describe(&event) {
            println!("{}", line);
        }
    }

    let report = session.join.await?;
    match &report.outcome {
        SessionOutcome::Complete { completed_runs } => {
            info!(session_id = %report.session_id, completed_runs, "Session complete");
            Ok(ExitCode::SUCCESS)
        }
        SessionOutcome::Failed {
            completed_runs,
            error: run_error,
        } => {
            error!(
                session_id = %report.session_id,
                completed_runs,
                phase = %run_error.phase(),
                error = %run_error,
                "Session failed"
            );
            Ok(ExitCode::from(EXIT_FAILED))
        }
        SessionOutcome::Cancelled { completed_runs } => {
            warn!(session_id = %report.session_id, completed_runs, "Session cancelled");
            Ok(ExitCode::from(EXIT_FAILED))
        }
    }
}

/// Parse a non-negative, finite number of seconds.
fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|_| format!("'{}' must be a finite, non-negative number of seconds", value))
}

fn validate(cli: &Cli) -> Result<(VideoRef, RunCount), ValidationError> {
    let video = VideoRef::from_url(&cli.url)?;
    let total_runs = cli.runs.parse()?;
    Ok((video, total_runs))
}
