use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "nudge-cli", version, about = "Planner nudge scheduler CLI")]
struct Cli {
    /// Local wall-clock time to act at, "YYYY-MM-DD HH:MM" (defaults to now)
    #[arg(long, global = true)]
    at: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Goal and activity facts read by eligibility
    Facts {
        #[command(subcommand)]
        action: commands::facts::FactsAction,
    },
    /// Feed a trigger into the reconciler
    Event {
        #[command(subcommand)]
        action: commands::event::EventAction,
    },
    /// Deliver notifications that are due
    Tick,
    /// Open a delivered nudge
    Open {
        /// Nudge type (e.g. "goal-nudge")
        nudge: nudge_core::NudgeType,
    },
    /// Ledger and outbox state
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manual QA helpers
    Debug {
        #[command(subcommand)]
        action: commands::debug::DebugAction,
    },
}

fn init_tracing() {
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("NUDGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn now(at: Option<&str>) -> Result<NaiveDateTime, Box<dyn std::error::Error>> {
    match at {
        Some(raw) => commands::parse_at(raw),
        None => Ok(chrono::Local::now().naive_local()),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = now(cli.at.as_deref()).and_then(|now| match cli.command {
        Commands::Config { action } => commands::config::run(action, now),
        Commands::Facts { action } => commands::facts::run(action, now),
        Commands::Event { action } => commands::event::run(action, now),
        Commands::Tick => commands::tick::run(now),
        Commands::Open { nudge } => commands::open::run(nudge, now),
        Commands::Status { json } => commands::status::run(json),
        Commands::Debug { action } => commands::debug::run(action, now),
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
