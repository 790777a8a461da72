//! Advisory command implementation

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, TimeZone};
use tallybook_core::advisor::{AdviceKind, Advisor, AdvisoryBackend, AdvisoryClient};
use tallybook_core::aggregate::{Aggregator, Window};
use tallybook_core::anomaly::AnomalyDetector;
use tallybook_core::models::{local_date, Record, RecordKind};
use tallybook_core::prompts::PromptLibrary;
use tallybook_core::streak::{compute_streak_with_cap, today_in};
use tallybook_core::summary::AdvisorySummary;
use tallybook_core::TallyConfig;

use super::{detect_month, load_records, resolve_month};

/// Build the advisory summary for one month of a snapshot
///
/// The workout streak is counted as of `today` or the last day of the month,
/// whichever comes first.
pub fn build_summary<Tz: TimeZone>(
    records: &[Record],
    label: &str,
    window: &Window,
    today: NaiveDate,
    config: &TallyConfig,
    tz: &Tz,
) -> AdvisorySummary {
    let current = window.filter(records);
    let detector = AnomalyDetector::new(config.anomaly);
    let anomalies = detect_month(records, window, config, &detector);

    let last_day = local_date(window.end_ms.saturating_sub(1), tz).map(|d| d.min(today));
    let streak = last_day.map_or(0, |as_of| {
        let active = Aggregator::active_days(records, Some(&[RecordKind::WorkoutCompleted]), tz);
        compute_streak_with_cap(&active, as_of, config.streak_lookback_cap)
    });

    AdvisorySummary::from_records(label, &current)
        .with_anomalies(&anomalies, tz)
        .with_streak(streak)
}

pub async fn cmd_advise<Tz: TimeZone>(
    file: &Path,
    kind: &str,
    month: Option<&str>,
    goal: Option<&str>,
    dry_run: bool,
    config: &TallyConfig,
    tz: &Tz,
) -> Result<()> {
    let kind: AdviceKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let report = load_records(file)?;
    let (label, window) = resolve_month(month, tz)?;
    let summary = build_summary(&report.records, &label, &window, today_in(tz), config, tz);

    if dry_run {
        let advisor = Advisor::new(None, PromptLibrary::new())
            .with_threshold_ratio(config.anomaly.threshold_ratio);
        println!("{}", advisor.render_prompt(kind, &summary, goal)?);
        return Ok(());
    }

    let advisor = Advisor::new(AdvisoryClient::from_config(&config.advisor)?, PromptLibrary::new())
        .with_threshold_ratio(config.anomaly.threshold_ratio);
    let Some(client) = advisor.backend() else {
        println!("⚠️  Advice is disabled (advisor.backend = disabled)");
        println!("   Use --dry-run to see the prompt that would be sent.");
        return Ok(());
    };

    print!("Checking {} at {}... ", client.model(), client.host());
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach the advisory backend at {}", client.host());
        println!("\nTo set up Ollama:");
        println!("  1. Install Ollama: https://ollama.ai/download");
        println!("  2. Start the server: ollama serve");
        println!("  3. Pull the model: ollama pull {}", client.model());
        println!("  4. Set environment variable: export OLLAMA_HOST={}", client.host());
        return Ok(());
    }

    let advice = advisor
        .advise(kind, summary, goal)
        .await
        .context("Failed to generate advice")?;

    // Figures are printed from the summary, never parsed out of the text
    let summary = &advice.summary;
    println!();
    println!("💡 {} for {}", advice.kind, summary.period);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Income:   {:>10.2}", summary.income_total);
    println!("   Expenses: {:>10.2}", summary.expense_total);
    println!("   Net:      {:>10.2}", summary.net);
    if let Some(top) = summary.top_categories.first() {
        println!(
            "   Top category: {} ({:.2}, {:.1}%)",
            top.category, top.amount, top.share_percent
        );
    }
    if !summary.anomalies.is_empty() {
        println!("   Anomalies: {}", summary.anomalies.len());
    }
    if let Some(streak) = summary.streak_days.filter(|s| *s > 0) {
        println!("   Workout streak: {} day(s)", streak);
    }
    println!();
    println!("{}", advice.text);
    println!();
    println!("   \x1b[2mGenerated by {}\x1b[0m", advice.model);

    Ok(())
}

