//! `quorum` CLI — run a meeting negotiation from a JSON request.
//!
//! ## Usage
//!
//! ```sh
//! # Negotiate, streaming progress lines to stdout
//! quorum schedule -i request.json
//!
//! # Read the request from stdin with a 2 second round timeout
//! cat request.json | quorum schedule --timeout-ms 2000
//!
//! # Print the final result as JSON (progress goes to stderr)
//! quorum schedule -i request.json --json
//!
//! # Validate a request without negotiating
//! quorum check -i request.json
//! ```
//!
//! A request looks like:
//!
//! ```json
//! {
//!   "meeting": { "name": "Team Sync", "date": "2026-03-16",
//!                "duration_minutes": 60, "minimum_participants": 2 },
//!   "participants": [
//!     { "id": "P1", "availability": [{ "date": "2026-03-16", "start": "09:00", "end": "12:00" }] }
//!   ],
//!   "config": { "round_timeout_ms": 5000 }
//! }
//! ```
//!
//! `schedule` exits 0 when a slot is scheduled, 2 when no slot satisfies the
//! quorum, and 1 on invalid input.

use std::io::{self, Read};
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quorum_engine::{
    Coordinator, CoordinatorConfig, MeetingRequirement, Participant, ProgressLevel,
};
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Exit status when the negotiation completes without a feasible slot.
const EXIT_INFEASIBLE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "quorum",
    version,
    about = "Find a meeting slot that enough participants can attend"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one negotiation round and print its progress
    Schedule {
        /// Request file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// How long to wait for participant responses, in milliseconds
        #[arg(long, env = "QUORUM_ROUND_TIMEOUT_MS")]
        timeout_ms: Option<u64>,
        /// Print the final result as JSON; progress lines go to stderr
        #[arg(long)]
        json: bool,
    },
    /// Validate a request and report malformed availability
    Check {
        /// Request file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

/// The JSON document accepted by both subcommands.
#[derive(Debug, Deserialize)]
struct NegotiationRequest {
    meeting: MeetingRequirement,
    participants: Vec<Participant>,
    #[serde(default)]
    config: CoordinatorConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Schedule {
            input,
            timeout_ms,
            json,
        } => {
            let request = read_request(input.as_deref())?;
            let accepted = schedule(request, timeout_ms, json).await?;
            if !accepted {
                process::exit(EXIT_INFEASIBLE);
            }
        }
        Commands::Check { input } => {
            let request = read_request(input.as_deref())?;
            check(&request)?;
        }
    }

    Ok(())
}

/// Run the negotiation, printing progress as it arrives. Returns whether a slot
/// was scheduled.
async fn schedule(request: NegotiationRequest, timeout_ms: Option<u64>, json: bool) -> Result<bool> {
    let mut config = request.config;
    if let Some(ms) = timeout_ms {
        config = config.with_round_timeout(Duration::from_millis(ms));
    }
    debug!(?config, participants = request.participants.len(), "starting negotiation");

    let mut negotiation = Coordinator::new(config)
        .spawn(request.meeting, request.participants)
        .context("Failed to start negotiation")?;

    while let Some(line) = negotiation.next_line().await {
        let text = match line.level {
            ProgressLevel::Warning => format!("warning: {}", line),
            ProgressLevel::Info | ProgressLevel::Success => line.to_string(),
        };
        if json {
            eprintln!("{}", text);
        } else {
            println!("{}", text);
        }
    }

    let result = negotiation
        .outcome()
        .await
        .context("Negotiation failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(result.accepted)
}

/// Validate the request without negotiating.
fn check(request: &NegotiationRequest) -> Result<()> {
    request
        .meeting
        .validate()
        .context("Meeting requirement is invalid")?;
    if request.participants.is_empty() {
        anyhow::bail!("Request lists no participants");
    }

    let mut usable_total = 0;
    for participant in &request.participants {
        let screening = participant.screen(request.meeting.date);
        usable_total += screening.usable.len();
        println!(
            "{}: {} usable window(s) on {}",
            participant.id,
            screening.usable.len(),
            request.meeting.date
        );
        for defect in &screening.malformed {
            println!("  warning: {}", defect);
        }
    }

    println!(
        "Request OK: {} ({} participants, {} usable windows)",
        request.meeting,
        request.participants.len(),
        usable_total
    );
    Ok(())
}

fn read_request(path: Option<&str>) -> Result<NegotiationRequest> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw).context("Failed to parse negotiation request")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
