//! Spending anomaly detection
//!
//! Compares each current-period expense against the average expense of the
//! same category over a historical window. A record is flagged when it is
//! both large in absolute terms and a large multiple of its baseline:
//!
//! - `amount >= absolute_floor`
//! - `amount >= baseline_average * threshold_ratio`
//!
//! The absolute floor suppresses spikes against near-zero baselines (a $5
//! coffee against a $2 average is not interesting). Baselines never include
//! the period being evaluated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::Window;
use crate::models::Record;

/// Default multiple of the baseline average that counts as a spike
pub const DEFAULT_THRESHOLD_RATIO: f64 = 2.5;
/// Default minimum amount for a record to be flagged at all
pub const DEFAULT_ABSOLUTE_FLOOR: f64 = 30.0;
/// Default length of the historical window before the evaluated period
pub const DEFAULT_HISTORY_DAYS: i64 = 90;

/// Detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    pub threshold_ratio: f64,
    pub absolute_floor: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: DEFAULT_THRESHOLD_RATIO,
            absolute_floor: DEFAULT_ABSOLUTE_FLOOR,
        }
    }
}

/// Historical average for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBaseline {
    pub total_amount: f64,
    pub record_count: u64,
    pub average_amount: f64,
}

impl CategoryBaseline {
    /// `None` for an empty group, so no baseline ever divides by zero
    fn from_totals(total_amount: f64, record_count: u64) -> Option<Self> {
        if record_count == 0 {
            return None;
        }
        Some(Self {
            total_amount,
            record_count,
            average_amount: total_amount / record_count as f64,
        })
    }
}

/// A current-period expense that spiked against its category baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    pub record_id: String,
    pub occurred_at_ms: Option<i64>,
    pub category: String,
    pub amount: f64,
    pub baseline_average: f64,
    /// `amount / baseline_average`
    pub ratio: f64,
}

/// Detects expenses that are large relative to their category history
#[derive(Debug, Clone, Default)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Per-category baselines over the expense records in `historical`
    pub fn baselines(&self, historical: &[Record]) -> BTreeMap<String, CategoryBaseline> {
        let mut sums: BTreeMap<&str, (f64, u64)> = BTreeMap::new();

        for record in historical.iter().filter(|r| r.is_expense()) {
            let amount = if record.amount.is_finite() {
                record.amount
            } else {
                0.0
            };
            let entry = sums.entry(record.category.as_str()).or_insert((0.0, 0));
            entry.0 += amount;
            entry.1 += 1;
        }

        sums.into_iter()
            .filter_map(|(category, (total, count))| {
                CategoryBaseline::from_totals(total, count).map(|b| (category.to_string(), b))
            })
            .collect()
    }

    /// Flag current-period expenses against baselines built from `historical`
    ///
    /// Output is sorted by ratio, largest first. The sort is stable, so equal
    /// ratios keep their order in `current`.
    pub fn detect(&self, current: &[Record], historical: &[Record]) -> Vec<Anomaly> {
        let baselines = self.baselines(historical);
        let mut anomalies = Vec::new();

        for record in current.iter().filter(|r| r.is_expense()) {
            if !record.amount.is_finite() {
                continue;
            }
            // No history means the record cannot be assessed
            let Some(baseline) = baselines.get(&record.category) else {
                continue;
            };
            if baseline.average_amount <= 0.0 {
                continue;
            }

            let meets_floor = record.amount >= self.config.absolute_floor;
            let meets_ratio =
                record.amount >= baseline.average_amount * self.config.threshold_ratio;
            if !(meets_floor && meets_ratio) {
                continue;
            }

            anomalies.push(Anomaly {
                record_id: record.id.clone(),
                occurred_at_ms: record.occurred_at_ms,
                category: record.category.clone(),
                amount: record.amount,
                baseline_average: baseline.average_amount,
                ratio: record.amount / baseline.average_amount,
            });
        }

        anomalies.sort_by(|a, b| {
            b.ratio
                .partial_cmp(&a.ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            current = current.len(),
            historical = historical.len(),
            baselines = baselines.len(),
            anomalies = anomalies.len(),
            "Anomaly detection complete"
        );

        anomalies
    }

    /// Split one snapshot into `window` and `history`, then detect
    ///
    /// Records without a timestamp belong to neither period.
    pub fn detect_in_window(
        &self,
        records: &[Record],
        window: &Window,
        history: &Window,
    ) -> Vec<Anomaly> {
        let current = window.filter(records);
        let historical: Vec<Record> = history
            .filter(records)
            .into_iter()
            .filter(|r| r.occurred_at_ms.is_some_and(|ms| !window.contains(ms)))
            .collect();
        self.detect(&current, &historical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;

    fn expense(id: &str, category: &str, amount: f64) -> Record {
        Record::new(id, RecordKind::Expense, amount).with_category(category)
    }

    fn history(category: &str, amounts: &[f64]) -> Vec<Record> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, a)| expense(&format!("{}-{}", category, i), category, *a))
            .collect()
    }

    #[test]
    fn test_floor_suppresses_small_spike() {
        let detector = AnomalyDetector::default();
        let historical = history("Coffee", &[3.0, 5.0, 4.0]);
        let current = vec![expense("latte", "Coffee", 12.0)];

        assert!(detector.detect(&current, &historical).is_empty());
    }

    #[test]
    fn test_large_spike_flagged_with_ratio() {
        let detector = AnomalyDetector::default();
        let historical = history("Electronics", &[40.0, 60.0]);
        let current = vec![expense("tv", "Electronics", 200.0)];

        let anomalies = detector.detect(&current, &historical);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].record_id, "tv");
        assert_eq!(anomalies[0].baseline_average, 50.0);
        assert_eq!(anomalies[0].ratio, 4.0);
    }

    #[test]
    fn test_below_ratio_not_flagged() {
        let detector = AnomalyDetector::default();
        let historical = history("Groceries", &[80.0]);
        let current = vec![expense("shop", "Groceries", 150.0)];

        assert!(detector.detect(&current, &historical).is_empty());
    }

    #[test]
    fn test_sorted_by_ratio_descending() {
        let detector = AnomalyDetector::default();
        let mut historical = history("A", &[20.0]);
        historical.extend(history("B", &[20.0]));
        let current = vec![expense("three", "A", 60.0), expense("five", "B", 100.0)];

        let anomalies = detector.detect(&current, &historical);

        let ids: Vec<&str> = anomalies.iter().map(|a| a.record_id.as_str()).collect();
        assert_eq!(ids, vec!["five", "three"]);
    }

    #[test]
    fn test_equal_ratios_keep_input_order() {
        let detector = AnomalyDetector::default();
        let mut historical = history("A", &[20.0]);
        historical.extend(history("B", &[20.0]));
        let current = vec![expense("first", "B", 60.0), expense("second", "A", 60.0)];

        let anomalies = detector.detect(&current, &historical);

        assert_eq!(anomalies[0].record_id, "first");
        assert_eq!(anomalies[1].record_id, "second");
    }

    #[test]
    fn test_no_history_never_flags() {
        let detector = AnomalyDetector::default();
        let historical = history("Rent", &[1000.0]);
        let current = vec![expense("boat", "Boats", 50_000.0)];

        assert!(detector.detect(&current, &historical).is_empty());
    }

    #[test]
    fn test_zero_baseline_is_not_evaluated() {
        let detector = AnomalyDetector::default();
        let historical = history("Freebies", &[0.0, 0.0]);
        let current = vec![expense("x", "Freebies", 100.0)];

        let baselines = detector.baselines(&historical);
        assert_eq!(baselines["Freebies"].average_amount, 0.0);
        assert!(detector.detect(&current, &historical).is_empty());
    }

    #[test]
    fn test_income_ignored_for_baselines_and_detection() {
        let detector = AnomalyDetector::default();
        let mut historical = history("Salary", &[10.0]);
        historical.push(Record::new("pay", RecordKind::Income, 5000.0).with_category("Salary"));
        let current =
            vec![Record::new("bonus", RecordKind::Income, 9000.0).with_category("Salary")];

        let baselines = detector.baselines(&historical);
        assert_eq!(baselines["Salary"].record_count, 1);
        assert!(detector.detect(&current, &historical).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        let detector = AnomalyDetector::default();
        assert!(detector.detect(&[], &[]).is_empty());
        assert!(detector.baselines(&[]).is_empty());
    }

    #[test]
    fn test_custom_thresholds() {
        let detector = AnomalyDetector::new(AnomalyConfig {
            threshold_ratio: 2.0,
            absolute_floor: 10.0,
        });
        let historical = history("Coffee", &[4.0]);
        let current = vec![expense("big", "Coffee", 12.0)];

        let anomalies = detector.detect(&current, &historical);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].ratio, 3.0);
    }

    #[test]
    fn test_detect_in_window_excludes_current_period_from_baseline() {
        let detector = AnomalyDetector::default();
        let window = Window::new(1_000, 2_000);
        let history_window = Window::new(0, 2_000);
        let records = vec![
            expense("old", "Gear", 50.0).at_ms(500),
            expense("spike", "Gear", 200.0).at_ms(1_500),
        ];

        // Even with an overlapping history window the spike never joins its own baseline
        let anomalies = detector.detect_in_window(&records, &window, &history_window);

        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].baseline_average, 50.0);
        assert_eq!(anomalies[0].occurred_at_ms, Some(1_500));
    }

    #[test]
    fn test_detect_is_deterministic() {
        let detector = AnomalyDetector::default();
        let historical = history("Gear", &[10.0, 20.0, 30.0]);
        let current = vec![
            expense("a", "Gear", 80.0),
            expense("b", "Gear", 100.0),
            expense("c", "Gear", 45.0),
        ];

        let first = detector.detect(&current, &historical);
        let second = detector.detect(&current, &historical);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }
}
