//! Report command implementations (summary, streak, anomalies)

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate, TimeZone};
use tallybook_core::aggregate::{to_f64, Aggregator, Window};
use tallybook_core::anomaly::{Anomaly, AnomalyDetector};
use tallybook_core::models::{local_date, Granularity, Record, RecordKind};
use tallybook_core::streak::{
    compute_streak_today, compute_streak_with_cap, longest_streak, today_in,
};
use tallybook_core::TallyConfig;

use super::{load_records, parse_date, truncate};

/// Resolve a period string to a label and window, relative to `today`
pub fn resolve_period<Tz: TimeZone>(
    period: &str,
    today: NaiveDate,
    tz: &Tz,
) -> Result<(String, Window)> {
    let period = period.trim().to_lowercase();

    match period.as_str() {
        "this-month" => month_window(today.year(), today.month(), tz),
        "last-month" => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            month_window(year, month, tz)
        }
        "this-year" => {
            let from = NaiveDate::from_ymd_opt(today.year(), 1, 1)
                .ok_or_else(|| anyhow!("Invalid year {}", today.year()))?;
            let to = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                .ok_or_else(|| anyhow!("Invalid year {}", today.year() + 1))?;
            Ok((today.year().to_string(), Window::for_dates(from, to, tz)?))
        }
        "all" => Ok(("all time".to_string(), Window::unbounded())),
        p if p.contains("-w") => {
            let (year, week) = p
                .split_once("-w")
                .and_then(|(y, w)| Some((y.parse::<i32>().ok()?, w.parse::<u32>().ok()?)))
                .ok_or_else(|| anyhow!("Invalid ISO week '{}' (use YYYY-Www)", p))?;
            let window = Window::for_iso_week(year, week, tz)?;
            Ok((format!("{}-W{:02}", year, week), window))
        }
        p => {
            let (year, month) = parse_month(p).with_context(|| {
                format!(
                    "Unknown period: {}. Available: this-month, last-month, this-year, all, YYYY-MM, YYYY-Www",
                    p
                )
            })?;
            month_window(year, month, tz)
        }
    }
}

/// Parse `YYYY-MM`
pub fn parse_month(s: &str) -> Result<(i32, u32)> {
    let (year, month) = s
        .trim()
        .split_once('-')
        .ok_or_else(|| anyhow!("Invalid month '{}' (use YYYY-MM)", s))?;
    let year: i32 = year
        .parse()
        .with_context(|| format!("Invalid year in '{}'", s))?;
    let month: u32 = month
        .parse()
        .with_context(|| format!("Invalid month in '{}'", s))?;
    if !(1..=12).contains(&month) {
        bail!("Month out of range in '{}'", s);
    }
    Ok((year, month))
}

fn month_window<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> Result<(String, Window)> {
    let window = Window::for_month(year, month, tz)?;
    Ok((format!("{:04}-{:02}", year, month), window))
}

/// Window for `--month`, defaulting to the current month
pub fn resolve_month<Tz: TimeZone>(month: Option<&str>, tz: &Tz) -> Result<(String, Window)> {
    match month {
        Some(m) => {
            let (year, month) = parse_month(m)?;
            month_window(year, month, tz)
        }
        None => resolve_period("this-month", today_in(tz), tz),
    }
}

pub fn cmd_summary<Tz: TimeZone>(
    file: &Path,
    period: &str,
    granularity: &str,
    json: bool,
    tz: &Tz,
) -> Result<()> {
    let report = load_records(file)?;
    let (label, window) = resolve_period(period, today_in(tz), tz)?;
    let granularity: Granularity = granularity.parse().map_err(|e: String| anyhow!(e))?;

    let aggregation = Aggregator::aggregate(&report.records, granularity, &window, tz);
    let categories = Aggregator::expense_by_category(&window.filter(&report.records));

    if json {
        let output = serde_json::json!({
            "period": label,
            "aggregation": aggregation,
            "categories": categories,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("📊 Summary: {} (by {})", label, granularity);
    println!("   ─────────────────────────────────────────────────────────────");

    if aggregation.is_empty() {
        println!("   No records found in this period.");
        return Ok(());
    }

    println!(
        "   {:12} │ {:>12} │ {:>12} │ {:>12} │ {:>5}",
        "Bucket", "Income", "Expense", "Net", "Count"
    );
    println!("   ─────────────┼──────────────┼──────────────┼──────────────┼──────");
    for (key, totals) in &aggregation.buckets {
        println!(
            "   {:12} │ {:>12.2} │ {:>12.2} │ {:>12.2} │ {:>5}",
            key,
            to_f64(totals.income_total),
            to_f64(totals.expense_total),
            to_f64(totals.net()),
            totals.count
        );
    }

    let combined = aggregation.combined();
    println!("   ─────────────┼──────────────┼──────────────┼──────────────┼──────");
    println!(
        "   {:12} │ {:>12.2} │ {:>12.2} │ {:>12.2} │ {:>5}",
        "Total",
        to_f64(combined.income_total),
        to_f64(combined.expense_total),
        to_f64(combined.net()),
        combined.count
    );

    if !categories.is_empty() {
        println!();
        println!("   {:25} │ {:>10} │ {:>5}", "Expense category", "Amount", "Count");
        println!("   ──────────────────────────┼────────────┼──────");
        for category in &categories {
            println!(
                "   {:25} │ {:>10.2} │ {:>5}",
                truncate(&category.category, 25),
                to_f64(category.amount),
                category.count
            );
        }
    }

    for kind in [RecordKind::Meal, RecordKind::Water, RecordKind::WorkoutCompleted] {
        let total = combined.kind_total(kind);
        if to_f64(total) > 0.0 {
            println!("   {}: {}", kind, total);
        }
    }

    if aggregation.unbucketable > 0 {
        println!();
        println!(
            "   \x1b[2m{} record(s) without a timestamp were not bucketed\x1b[0m",
            aggregation.unbucketable
        );
    }

    Ok(())
}

pub fn cmd_streak<Tz: TimeZone>(
    file: &Path,
    kind: &str,
    as_of: Option<&str>,
    config: &TallyConfig,
    tz: &Tz,
) -> Result<()> {
    let report = load_records(file)?;
    let kind: RecordKind = kind.parse().map_err(|e: String| anyhow!(e))?;
    let active = Aggregator::active_days(&report.records, Some(&[kind]), tz);
    let (as_of, current) = match as_of {
        Some(date) => {
            let as_of = parse_date(date, "--as-of")?;
            let current = compute_streak_with_cap(&active, as_of, config.streak_lookback_cap);
            (as_of, current)
        }
        None => (
            today_in(tz),
            compute_streak_today(&active, tz, config.streak_lookback_cap),
        ),
    };
    let longest = longest_streak(&active);

    println!();
    println!("🔥 {} streak as of {}", kind, as_of);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Current: {} day(s)", current);
    println!("   Longest: {} day(s)", longest);
    println!("   Active days: {}", active.len());

    if current == 0 && !active.is_empty() {
        println!();
        println!("   No {} recorded on {} yet.", kind, as_of);
    }

    Ok(())
}

/// Detect anomalies for one month against the configured history window
pub fn detect_month(
    records: &[Record],
    window: &Window,
    config: &TallyConfig,
    detector: &AnomalyDetector,
) -> Vec<Anomaly> {
    let history = window.preceding_days(config.history_days);
    detector.detect_in_window(records, window, &history)
}

pub fn cmd_anomalies<Tz: TimeZone>(
    file: &Path,
    month: Option<&str>,
    ratio: Option<f64>,
    floor: Option<f64>,
    json: bool,
    config: &TallyConfig,
    tz: &Tz,
) -> Result<()> {
    let mut anomaly_config = config.anomaly;
    if let Some(ratio) = ratio {
        if !(ratio.is_finite() && ratio > 0.0) {
            bail!("--ratio must be a positive number");
        }
        anomaly_config.threshold_ratio = ratio;
    }
    if let Some(floor) = floor {
        if !(floor.is_finite() && floor >= 0.0) {
            bail!("--floor must be zero or more");
        }
        anomaly_config.absolute_floor = floor;
    }

    let report = load_records(file)?;
    let (label, window) = resolve_month(month, tz)?;
    let detector = AnomalyDetector::new(anomaly_config);
    let anomalies = detect_month(&report.records, &window, config, &detector);

    if json {
        println!("{}", serde_json::to_string_pretty(&anomalies)?);
        return Ok(());
    }

    println!();
    println!("🚨 Spending anomalies: {}", label);
    println!(
        "   Threshold: {}× baseline, at least {:.2} ({} days of history)",
        anomaly_config.threshold_ratio, anomaly_config.absolute_floor, config.history_days
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if anomalies.is_empty() {
        println!("   Nothing unusual this period.");
        return Ok(());
    }

    println!(
        "   {:10} │ {:20} │ {:>10} │ {:>10} │ {:>6}",
        "Date", "Category", "Amount", "Baseline", "Ratio"
    );
    println!("   ───────────┼──────────────────────┼────────────┼────────────┼───────");
    for anomaly in &anomalies {
        let date = anomaly
            .occurred_at_ms
            .and_then(|ms| local_date(ms, tz))
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:10} │ {:20} │ {:>10.2} │ {:>10.2} │ {:>5.1}×",
            date,
            truncate(&anomaly.category, 20),
            anomaly.amount,
            anomaly.baseline_average,
            anomaly.ratio
        );
    }

    Ok(())
}
