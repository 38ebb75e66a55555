//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Automated work-time reconciliation against an issue tracker.
///
/// Once per business day (or on demand), fetches the issues each user
/// touched, checks whether time was already logged, and submits a fair
/// allocation of the day's hours if not.
#[derive(Debug, Parser)]
#[command(name = "wa", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run one reconciliation pass now.
    Run {
        /// How many days back the target day lies.
        #[arg(long, default_value_t = 1)]
        days_ago: u32,

        /// Reconcile only this user's config.
        #[arg(long)]
        user: Option<String>,
    },

    /// Start the daily schedule and run until interrupted.
    Schedule,

    /// Show circuit breaker and rate limiter state.
    Status,
}
