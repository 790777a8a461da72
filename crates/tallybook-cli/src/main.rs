//! Tally CLI - Totals, streaks and spending anomalies
//!
//! Usage:
//!   tally summary --file snapshot.json --period 2024-05
//!   tally streak --file snapshot.json --kind workout-completed
//!   tally anomalies --file snapshot.json --month 2024-05
//!   tally advise --file snapshot.json --kind saving-plan

mod cli;
mod commands;


use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use clap::Parser;
use tallybook_core::TallyConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = TallyConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .with_env_overrides();

    match cli.tz_offset.as_deref() {
        Some(offset) => {
            let tz = commands::parse_tz_offset(offset)?;
            run(cli.command, &config, &tz).await
        }
        None => run(cli.command, &config, &Local).await,
    }
}

/// Dispatch a command with every calendar key derived in `tz`
async fn run<Tz: TimeZone>(command: Commands, config: &TallyConfig, tz: &Tz) -> Result<()> {
    match command {
        Commands::Summary {
            file,
            period,
            granularity,
            json,
        } => commands::cmd_summary(&file, &period, &granularity, json, tz),
        Commands::Streak { file, kind, as_of } => {
            commands::cmd_streak(&file, &kind, as_of.as_deref(), config, tz)
        }
        Commands::Anomalies {
            file,
            month,
            ratio,
            floor,
            json,
        } => commands::cmd_anomalies(&file, month.as_deref(), ratio, floor, json, config, tz),
        Commands::Advise {
            file,
            kind,
            month,
            goal,
            dry_run,
        } => {
            commands::cmd_advise(
                &file,
                &kind,
                month.as_deref(),
                goal.as_deref(),
                dry_run,
                config,
                tz,
            )
            .await
        }
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { id }) => commands::cmd_prompts_show(&id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
        Commands::Config => commands::cmd_config(config),
    }
}
