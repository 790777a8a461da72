//! Data models for Tallybook
//!
//! Records are immutable snapshots of documents fetched from the external
//! store. Everything else in the crate (buckets, baselines, anomalies) is
//! derived from them on every recomputation.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Category assigned to records that arrive without one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Kind of a record (closed set shared by the finance and wellness views)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecordKind {
    Income,
    Expense,
    Meal,
    Water,
    WorkoutCompleted,
    WorkoutCancelled,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Meal => "meal",
            Self::Water => "water",
            Self::WorkoutCompleted => "workout-completed",
            Self::WorkoutCancelled => "workout-cancelled",
        }
    }

    pub fn all() -> &'static [RecordKind] {
        &[
            Self::Income,
            Self::Expense,
            Self::Meal,
            Self::Water,
            Self::WorkoutCompleted,
            Self::WorkoutCancelled,
        ]
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "meal" => Ok(Self::Meal),
            "water" => Ok(Self::Water),
            "workout-completed" | "completed" => Ok(Self::WorkoutCompleted),
            "workout-cancelled" | "cancelled" | "canceled" => Ok(Self::WorkoutCancelled),
            _ => Err(format!(
                "Unknown record kind: {} (valid: income, expense, meal, water, workout-completed, workout-cancelled)",
                s
            )),
        }
    }
}

/// A single transaction, meal or workout entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Currency units for finance records, minutes or ml for the wellness variants
    pub amount: f64,
    pub kind: RecordKind,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Epoch milliseconds; `None` when neither the occurred nor created timestamp was present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurred_at_ms: Option<i64>,
}

impl Record {
    pub fn new(id: impl Into<String>, kind: RecordKind, amount: f64) -> Self {
        Self {
            id: id.into(),
            amount,
            kind,
            category: UNCATEGORIZED.to_string(),
            note: None,
            occurred_at_ms: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn at_ms(mut self, occurred_at_ms: i64) -> Self {
        self.occurred_at_ms = Some(occurred_at_ms);
        self
    }

    pub fn is_expense(&self) -> bool {
        self.kind == RecordKind::Expense
    }

    /// Local calendar date of the record, if it has a usable timestamp
    pub fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.occurred_at_ms.and_then(|ms| local_date(ms, tz))
    }
}

/// Convert epoch milliseconds to the calendar date observed in `tz`
///
/// Uses the local year/month/day fields, never truncation of the raw epoch
/// value, so a record at local midnight lands on the local day.
pub fn local_date<Tz: TimeZone>(ms: i64, tz: &Tz) -> Option<NaiveDate> {
    tz.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.date_naive())
}

/// Calendar day key, rendered as `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn pred(&self) -> Option<Self> {
        self.0.pred_opt().map(Self)
    }

    pub fn succ(&self) -> Option<Self> {
        self.0.succ_opt().map(Self)
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DayKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| format!("Invalid day key: {} (expected YYYY-MM-DD)", s))
    }
}

impl Serialize for DayKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DayKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// `YYYY-MM` key of a date
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// `YYYY-Www` key using the ISO week-numbering year
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

/// Bucket granularity for time-bucketed views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    Month,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Bucket key for a local calendar date
    pub fn key_for(&self, date: NaiveDate) -> String {
        match self {
            Self::Day => DayKey(date).to_string(),
            Self::Week => iso_week_key(date),
            Self::Month => month_key(date),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            _ => Err(format!(
                "Unknown granularity: {} (valid: day, week, month)",
                s
            )),
        }
    }
}

/// A data-quality problem found while normalizing a raw document
///
/// None of these abort a computation; each one is recovered with a safe
/// default or by skipping the single document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DataQualityIssue {
    MissingId { index: usize },
    NonNumericAmount { record_id: String },
    NonFiniteAmount { record_id: String },
    NegativeAmount { record_id: String, amount: f64 },
    MissingCategory { record_id: String },
    MissingTimestamp { record_id: String },
    UnknownKind { record_id: String, kind: Option<String> },
    MalformedDocument { index: usize, reason: String },
}

impl DataQualityIssue {
    /// Whether the document was dropped rather than repaired
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::UnknownKind { .. } | Self::MalformedDocument { .. }
        )
    }
}

impl fmt::Display for DataQualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingId { index } => write!(f, "document #{} has no id", index),
            Self::NonNumericAmount { record_id } => {
                write!(f, "record {} has a non-numeric amount, using 0", record_id)
            }
            Self::NonFiniteAmount { record_id } => {
                write!(f, "record {} has a non-finite amount, using 0", record_id)
            }
            Self::NegativeAmount { record_id, amount } => write!(
                f,
                "record {} has a negative amount {}, using its magnitude",
                record_id, amount
            ),
            Self::MissingCategory { record_id } => {
                write!(f, "record {} has no category, using {}", record_id, UNCATEGORIZED)
            }
            Self::MissingTimestamp { record_id } => write!(
                f,
                "record {} has no timestamp, excluded from time-bucketed views",
                record_id
            ),
            Self::UnknownKind { record_id, kind } => write!(
                f,
                "record {} has unknown kind {}, skipped",
                record_id,
                kind.as_deref().unwrap_or("(missing)")
            ),
            Self::MalformedDocument { index, reason } => {
                write!(f, "document #{} is malformed ({}), skipped", index, reason)
            }
        }
    }
}
