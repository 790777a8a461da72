//! Snapshot loading and normalization
//!
//! A snapshot is the complete list of documents the external store returned
//! for one query. Documents are loosely typed (amounts may be strings,
//! timestamps may be missing), so each one is normalized into a [`Record`]
//! and every repair is reported as a [`DataQualityIssue`]. A bad document
//! never prevents the rest of the snapshot from loading.

use std::fs;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{DataQualityIssue, Record, RecordKind, UNCATEGORIZED};

/// A document as delivered by the store, before normalization
///
/// Fields stay raw JSON so a wrongly typed field is repaired during
/// normalization instead of rejecting the whole document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub id: Option<Value>,
    pub amount: Option<Value>,
    pub kind: Option<Value>,
    pub category: Option<Value>,
    pub note: Option<Value>,
    pub occurred_at_ms: Option<Value>,
    pub created_at_ms: Option<Value>,
}

/// Accepted spellings per field, most preferred first
const KIND_KEYS: &[&str] = &["kind", "type"];
const OCCURRED_KEYS: &[&str] = &["occurred_at_ms", "occurredAtMs", "occurredAt"];
const CREATED_KEYS: &[&str] = &["created_at_ms", "createdAtMs", "createdAt"];

impl RawRecord {
    /// Pick the known fields out of a JSON object
    ///
    /// When a document carries several spellings of one field, the first
    /// non-null one in preference order wins. Unknown fields are ignored.
    pub fn from_document(document: Value) -> std::result::Result<Self, String> {
        let mut map = match document {
            Value::Object(map) => map,
            other => return Err(format!("expected an object, found {}", json_type(&other))),
        };
        let mut take = |keys: &[&str]| {
            keys.iter()
                .find_map(|key| map.remove(*key).filter(|value| !value.is_null()))
        };

        Ok(Self {
            id: take(&["id"]),
            amount: take(&["amount"]),
            kind: take(KIND_KEYS),
            category: take(&["category"]),
            note: take(&["note"]),
            occurred_at_ms: take(OCCURRED_KEYS),
            created_at_ms: take(CREATED_KEYS),
        })
    }

    /// Normalize into a record, collecting every repair made along the way
    ///
    /// Returns `None` for the record when the document cannot be used at all.
    pub fn normalize(self, index: usize) -> (Option<Record>, Vec<DataQualityIssue>) {
        let mut issues = Vec::new();

        let id = match self.id.as_ref().and_then(value_to_id) {
            Some(id) => id,
            None => {
                issues.push(DataQualityIssue::MissingId { index });
                format!("#{}", index)
            }
        };

        let parsed = self
            .kind
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|k| k.parse::<RecordKind>().ok());
        let Some(kind) = parsed else {
            issues.push(DataQualityIssue::UnknownKind {
                record_id: id,
                kind: self.kind.map(|raw| match raw {
                    Value::String(s) => s,
                    raw => raw.to_string(),
                }),
            });
            return (None, issues);
        };

        let amount = match self.amount.as_ref().map(coerce_amount) {
            Some(Amount::Finite(a)) if a < 0.0 => {
                issues.push(DataQualityIssue::NegativeAmount {
                    record_id: id.clone(),
                    amount: a,
                });
                a.abs()
            }
            Some(Amount::Finite(a)) => a,
            Some(Amount::NonFinite) => {
                issues.push(DataQualityIssue::NonFiniteAmount {
                    record_id: id.clone(),
                });
                0.0
            }
            Some(Amount::NonNumeric) | None => {
                issues.push(DataQualityIssue::NonNumericAmount {
                    record_id: id.clone(),
                });
                0.0
            }
        };

        let category = match self.category.as_ref().and_then(Value::as_str).map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                issues.push(DataQualityIssue::MissingCategory {
                    record_id: id.clone(),
                });
                UNCATEGORIZED.to_string()
            }
        };

        let occurred_at_ms = self
            .occurred_at_ms
            .as_ref()
            .and_then(coerce_timestamp)
            .or_else(|| self.created_at_ms.as_ref().and_then(coerce_timestamp));
        if occurred_at_ms.is_none() {
            issues.push(DataQualityIssue::MissingTimestamp {
                record_id: id.clone(),
            });
        }

        // A note is free text; anything else is dropped without an issue
        let note = match self.note {
            Some(Value::String(n)) if !n.trim().is_empty() => Some(n),
            _ => None,
        };

        let record = Record {
            id,
            amount,
            kind,
            category,
            note,
            occurred_at_ms,
        };
        (Some(record), issues)
    }
}

enum Amount {
    Finite(f64),
    NonFinite,
    NonNumeric,
}

fn coerce_amount(value: &Value) -> Amount {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(a) if a.is_finite() => Amount::Finite(a),
        Some(_) => Amount::NonFinite,
        None => Amount::NonNumeric,
    }
}

fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Records plus the data-quality issues found while producing them
#[derive(Debug, Clone, Default, Serialize)]
pub struct SnapshotReport {
    pub records: Vec<Record>,
    pub issues: Vec<DataQualityIssue>,
    /// Documents dropped entirely
    pub skipped: usize,
}

impl SnapshotReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Normalize a list of raw JSON documents
pub fn normalize_documents(documents: Vec<Value>) -> SnapshotReport {
    let mut report = SnapshotReport::default();

    for (index, document) in documents.into_iter().enumerate() {
        let raw = match RawRecord::from_document(document) {
            Ok(raw) => raw,
            Err(reason) => {
                let issue = DataQualityIssue::MalformedDocument { index, reason };
                warn!("{}", issue);
                report.issues.push(issue);
                report.skipped += 1;
                continue;
            }
        };

        let (record, issues) = raw.normalize(index);
        for issue in &issues {
            warn!("{}", issue);
        }
        report.issues.extend(issues);
        match record {
            Some(record) => report.records.push(record),
            None => report.skipped += 1,
        }
    }

    debug!(
        records = report.records.len(),
        issues = report.issues.len(),
        skipped = report.skipped,
        "Normalized snapshot"
    );

    report
}

/// Parse a snapshot from JSON text
///
/// Accepts either a bare array of documents or an object with a `records`
/// array.
pub fn parse_snapshot(json: &str) -> Result<SnapshotReport> {
    let value: Value = serde_json::from_str(json)?;
    let documents = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::InvalidData(
                    "Snapshot object must contain a \"records\" array".into(),
                ))
            }
        },
        _ => {
            return Err(Error::InvalidData(
                "Snapshot must be a JSON array or an object with \"records\"".into(),
            ))
        }
    };
    Ok(normalize_documents(documents))
}

/// Load and normalize a snapshot file
pub fn load_snapshot(path: &Path) -> Result<SnapshotReport> {
    let content = fs::read_to_string(path)?;
    parse_snapshot(&content)
}
