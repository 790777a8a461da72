//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tally - Totals, streaks and spending anomalies from a Tallybook snapshot
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Reports over a Tallybook records snapshot", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Fixed UTC offset for calendar days, e.g. -04:00 (default: system local time)
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub tz_offset: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Income and expense totals per day, week or month
    Summary {
        /// Snapshot file (JSON array or {"records": [...]})
        #[arg(short, long)]
        file: PathBuf,

        /// Time period: this-month, last-month, this-year, all, YYYY-MM or YYYY-Www
        #[arg(short, long, default_value = "this-month")]
        period: String,

        /// Bucket size: day, week, month
        #[arg(short, long, default_value = "month")]
        granularity: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Current and longest streak of consecutive active days
    Streak {
        /// Snapshot file
        #[arg(short, long)]
        file: PathBuf,

        /// Record kind that marks a day as active
        #[arg(short, long, default_value = "workout-completed")]
        kind: String,

        /// Count the streak ending on this day (YYYY-MM-DD, default: today)
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Expenses that spiked against their category history
    Anomalies {
        /// Snapshot file
        #[arg(short, long)]
        file: PathBuf,

        /// Month to evaluate (YYYY-MM, default: this month)
        #[arg(short, long)]
        month: Option<String>,

        /// Override the threshold ratio
        #[arg(long)]
        ratio: Option<f64>,

        /// Override the absolute floor
        #[arg(long)]
        floor: Option<f64>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Generate advice from a month's summary using the configured model
    Advise {
        /// Snapshot file
        #[arg(short, long)]
        file: PathBuf,

        /// Advice type: saving-plan, insights, anomalies
        #[arg(short, long, default_value = "insights")]
        kind: String,

        /// Month to summarize (YYYY-MM, default: this month)
        #[arg(short, long)]
        month: Option<String>,

        /// Saving goal passed to the saving-plan prompt
        #[arg(long)]
        goal: Option<String>,

        /// Print the rendered prompt without calling the model
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage advisory prompts
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },

    /// Show the effective configuration
    Config,
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List prompts and their override status
    List,

    /// Show a prompt's content
    Show {
        /// Prompt ID (e.g. saving_plan)
        id: String,
    },

    /// Print the override directory
    Path,
}
