//! Shared command utilities
//!
//! This module contains:
//! - `load_records` - Load and normalize a snapshot file
//! - `parse_tz_offset` - Parse the `--tz-offset` flag

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, NaiveDate};
use tallybook_core::{load_snapshot, SnapshotReport};
use tracing::info;

/// Load a snapshot, reporting data-quality problems without failing
pub fn load_records(path: &Path) -> Result<SnapshotReport> {
    let report = load_snapshot(path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))?;

    info!(
        records = report.records.len(),
        skipped = report.skipped,
        "Loaded snapshot"
    );

    if report.has_issues() {
        println!(
            "⚠️  {} data-quality issue(s) in {} ({} document(s) skipped, run with --verbose for details)",
            report.issues.len(),
            path.display(),
            report.skipped
        );
    }

    Ok(report)
}

/// Parse `+HH:MM`, `-HH:MM`, `+HHMM`, `+HH`, `Z` or `UTC`
pub fn parse_tz_offset(s: &str) -> Result<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).context("Invalid UTC offset");
    }

    let (sign, rest) = match s.chars().next() {
        Some('+') => (1, &s[1..]),
        Some('-') => (-1, &s[1..]),
        _ => bail!("Invalid --tz-offset '{}' (use +HH:MM or -HH:MM)", s),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || !matches!(digits.len(), 2 | 4) {
        bail!("Invalid --tz-offset '{}' (use +HH:MM or -HH:MM)", s);
    }

    let hours: i32 = digits[..2].parse()?;
    let minutes: i32 = if digits.len() == 4 {
        digits[2..].parse()?
    } else {
        0
    };
    if hours > 14 || minutes > 59 {
        bail!("--tz-offset '{}' is out of range", s);
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .with_context(|| format!("--tz-offset '{}' is out of range", s))
}

/// Parse a `YYYY-MM-DD` flag value
pub fn parse_date(s: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid {} date '{}' (use YYYY-MM-DD)", flag, s))
}
