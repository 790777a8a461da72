//! Advisory summary payload
//!
//! The summary is the only thing handed to the text-generation service. All
//! figures are rounded here, before serialization, so the generated prose can
//! quote them but never has to compute them. Whatever the model writes, the
//! numbers shown to users come from this struct.

use chrono::TimeZone;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::aggregate::{to_f64, Aggregator};
use crate::anomaly::Anomaly;
use crate::error::Result;
use crate::models::{local_date, DayKey, Record};

/// Number of expense categories included in a summary
pub const MAX_TOP_CATEGORIES: usize = 5;

/// Round to two decimals; non-finite values become zero
pub fn round_money(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Round an exact total to cents, halves away from zero
pub fn round_total(value: Decimal) -> f64 {
    to_f64(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub amount: f64,
    pub share_percent: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalySummary {
    pub category: String,
    pub amount: f64,
    pub baseline_average: f64,
    pub ratio: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Finalized figures for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorySummary {
    pub period: String,
    pub income_total: f64,
    pub expense_total: f64,
    pub net: f64,
    pub record_count: u64,
    pub top_categories: Vec<CategoryShare>,
    pub anomalies: Vec<AnomalySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streak_days: Option<u32>,
}

impl AdvisorySummary {
    /// Summarize the records of one period
    pub fn from_records(period: impl Into<String>, records: &[Record]) -> Self {
        let totals = Aggregator::totals(records);

        let top_categories = Aggregator::expense_by_category(records)
            .into_iter()
            .take(MAX_TOP_CATEGORIES)
            .map(|c| CategoryShare {
                share_percent: c
                    .amount
                    .checked_div(totals.expense_total)
                    .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                    .map_or(0.0, round_total),
                amount: round_total(c.amount),
                category: c.category,
                count: c.count,
            })
            .collect();

        Self {
            period: period.into(),
            income_total: round_total(totals.income_total),
            expense_total: round_total(totals.expense_total),
            net: round_total(totals.net),
            record_count: totals.count,
            top_categories,
            anomalies: Vec::new(),
            streak_days: None,
        }
    }

    /// Attach anomalies, dated in the caller's local calendar
    pub fn with_anomalies<Tz: TimeZone>(mut self, anomalies: &[Anomaly], tz: &Tz) -> Self {
        self.anomalies = anomalies
            .iter()
            .map(|a| AnomalySummary {
                category: a.category.clone(),
                amount: round_money(a.amount),
                baseline_average: round_money(a.baseline_average),
                ratio: round_money(a.ratio),
                date: a
                    .occurred_at_ms
                    .and_then(|ms| local_date(ms, tz))
                    .map(|d| DayKey::from(d).to_string()),
            })
            .collect();
        self
    }

    pub fn with_streak(mut self, streak_days: u32) -> Self {
        self.streak_days = Some(streak_days);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;
    use chrono::Utc;

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(10.005_1), 10.01);
        assert_eq!(round_money(3.333_333), 3.33);
        assert_eq!(round_money(-2.499), -2.5);
        assert_eq!(round_money(f64::NAN), 0.0);
        assert_eq!(round_money(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_round_total() {
        assert_eq!(round_total("10.005".parse().unwrap()), 10.01);
        assert_eq!(round_total("-2.345".parse().unwrap()), -2.35);
        assert_eq!(round_total(Decimal::ZERO), 0.0);
    }

    #[test]
    fn test_summary_cent_amounts_are_exact() {
        let records: Vec<Record> = [0.1, 0.2, 0.3]
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                Record::new(format!("r{}", i), RecordKind::Expense, *amount).with_category("Snacks")
            })
            .collect();

        let summary = AdvisorySummary::from_records("2024-05", &records);

        assert_eq!(summary.expense_total, 0.6);
        assert_eq!(summary.top_categories[0].share_percent, 100.0);
    }

    #[test]
    fn test_summary_from_records() {
        let records = vec![
            Record::new("a", RecordKind::Expense, 100.0).with_category("Food"),
            Record::new("b", RecordKind::Expense, 33.333).with_category("Fun"),
            Record::new("c", RecordKind::Income, 50.0),
        ];

        let summary = AdvisorySummary::from_records("2024-05", &records);

        assert_eq!(summary.period, "2024-05");
        assert_eq!(summary.expense_total, 133.33);
        assert_eq!(summary.income_total, 50.0);
        assert_eq!(summary.net, -83.33);
        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.top_categories[0].category, "Food");
        assert_eq!(summary.top_categories[0].share_percent, 75.0);
        assert_eq!(summary.top_categories[1].amount, 33.33);
        assert!(summary.streak_days.is_none());
    }

    #[test]
    fn test_summary_limits_categories() {
        let records: Vec<Record> = (0..8)
            .map(|i| {
                Record::new(format!("r{}", i), RecordKind::Expense, 10.0 + i as f64)
                    .with_category(format!("C{}", i))
            })
            .collect();

        let summary = AdvisorySummary::from_records("all", &records);
        assert_eq!(summary.top_categories.len(), MAX_TOP_CATEGORIES);
        assert_eq!(summary.top_categories[0].category, "C7");
    }

    #[test]
    fn test_summary_empty_period() {
        let summary = AdvisorySummary::from_records("2024-05", &[]);
        assert_eq!(summary.expense_total, 0.0);
        assert!(summary.top_categories.is_empty());
        assert!(summary.anomalies.is_empty());
    }

    #[test]
    fn test_summary_anomalies_and_streak_serialized_rounded() {
        let anomaly = Anomaly {
            record_id: "tv".into(),
            occurred_at_ms: Some(
                Utc.with_ymd_and_hms(2024, 5, 5, 12, 0, 0)
                    .unwrap()
                    .timestamp_millis(),
            ),
            category: "Electronics".into(),
            amount: 200.0,
            baseline_average: 66.666_666,
            ratio: 3.000_000_3,
        };

        let summary = AdvisorySummary::from_records("2024-05", &[])
            .with_anomalies(&[anomaly], &Utc)
            .with_streak(4);
        let json = summary.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["anomalies"][0]["baseline_average"], 66.67);
        assert_eq!(value["anomalies"][0]["ratio"], 3.0);
        assert_eq!(value["anomalies"][0]["date"], "2024-05-05");
        assert_eq!(value["streak_days"], 4);
    }
}
