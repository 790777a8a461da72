//! Time-bucketing aggregator
//!
//! Groups a flat list of records into local calendar buckets (day, ISO week
//! or month) and sums amounts per bucket. Every function here is a single
//! pass over an in-memory snapshot with no side effects; callers recompute
//! from scratch whenever a new snapshot arrives.
//!
//! Sums are kept as [`Decimal`] so that day buckets add up to their week and
//! month buckets exactly. Convert with [`to_f64`] only for display.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Weekday};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{DayKey, Granularity, Record, RecordKind};

const MS_PER_DAY: i64 = 86_400_000;

/// Half-open `[start_ms, end_ms)` range of epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl Window {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// Window that admits every timestamp
    pub fn unbounded() -> Self {
        Self {
            start_ms: i64::MIN,
            end_ms: i64::MAX,
        }
    }

    /// From local midnight of `start` up to local midnight of `end_exclusive`
    pub fn for_dates<Tz: TimeZone>(
        start: NaiveDate,
        end_exclusive: NaiveDate,
        tz: &Tz,
    ) -> Result<Self> {
        if end_exclusive < start {
            return Err(Error::InvalidData(format!(
                "Window end {} is before start {}",
                end_exclusive, start
            )));
        }
        Ok(Self {
            start_ms: local_midnight_ms(start, tz)?,
            end_ms: local_midnight_ms(end_exclusive, tz)?,
        })
    }

    /// The local calendar month `year-month`
    pub fn for_month<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}-{}", year, month)))?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .ok_or_else(|| Error::InvalidData(format!("Invalid month: {}-{}", year, month)))?;
        Self::for_dates(start, end, tz)
    }

    /// The ISO week `week` of ISO year `year` (Monday through Sunday)
    pub fn for_iso_week<Tz: TimeZone>(year: i32, week: u32, tz: &Tz) -> Result<Self> {
        let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).ok_or_else(|| {
            Error::InvalidData(format!("Invalid ISO week: {}-W{:02}", year, week))
        })?;
        Self::for_dates(start, start + Duration::days(7), tz)
    }

    /// The `days` immediately before this window, ending where it starts
    pub fn preceding_days(&self, days: i64) -> Self {
        Self {
            start_ms: self
                .start_ms
                .saturating_sub(days.saturating_mul(MS_PER_DAY)),
            end_ms: self.start_ms,
        }
    }

    pub fn contains(&self, ms: i64) -> bool {
        ms >= self.start_ms && ms < self.end_ms
    }

    /// Records whose timestamp falls inside the window
    pub fn filter(&self, records: &[Record]) -> Vec<Record> {
        records
            .iter()
            .filter(|r| r.occurred_at_ms.is_some_and(|ms| self.contains(ms)))
            .cloned()
            .collect()
    }
}

/// Epoch milliseconds of local midnight on `date`
///
/// When midnight does not exist locally (a DST gap), the first valid instant
/// after it is used.
pub fn local_midnight_ms<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Result<i64> {
    let midnight = date.and_time(NaiveTime::MIN);
    // Gaps are at most a few hours; step forward 15 minutes at a time.
    for step in 0..=16 {
        let candidate = midnight + Duration::minutes(15 * step);
        if let Some(dt) = tz.from_local_datetime(&candidate).earliest() {
            return Ok(dt.timestamp_millis());
        }
    }
    Err(Error::InvalidData(format!(
        "No valid local time at the start of {}",
        date
    )))
}

/// Exact decimal for a record amount
///
/// Goes through the shortest decimal text of the float, so `82.64` becomes
/// exactly `82.64` rather than its binary approximation. Returns `None` for
/// non-finite or out-of-range values.
pub fn to_decimal(amount: f64) -> Option<Decimal> {
    if !amount.is_finite() {
        return None;
    }
    amount.to_string().parse().ok()
}

/// Nearest `f64` to a decimal total
pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_string().parse().unwrap_or(0.0)
}

fn add(total: &mut Decimal, amount: Decimal) {
    *total = total.saturating_add(amount);
}

/// Totals for a single bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketTotals {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub count: u64,
    /// Sum of amounts per category across every kind
    pub per_category_total: BTreeMap<String, Decimal>,
    /// Sum of amounts per kind (meal minutes, water ml, workout minutes, ...)
    pub kind_totals: BTreeMap<RecordKind, Decimal>,
}

impl BucketTotals {
    fn add(&mut self, record: &Record, amount: Decimal) {
        match record.kind {
            RecordKind::Income => add(&mut self.income_total, amount),
            RecordKind::Expense => add(&mut self.expense_total, amount),
            _ => {}
        }
        self.count += 1;
        add(
            self.per_category_total
                .entry(record.category.clone())
                .or_default(),
            amount,
        );
        add(self.kind_totals.entry(record.kind).or_default(), amount);
    }

    fn merge(&mut self, other: &BucketTotals) {
        add(&mut self.income_total, other.income_total);
        add(&mut self.expense_total, other.expense_total);
        self.count += other.count;
        for (category, amount) in &other.per_category_total {
            add(self.per_category_total.entry(category.clone()).or_default(), *amount);
        }
        for (kind, amount) in &other.kind_totals {
            add(self.kind_totals.entry(*kind).or_default(), *amount);
        }
    }

    pub fn net(&self) -> Decimal {
        self.income_total.saturating_sub(self.expense_total)
    }

    pub fn kind_total(&self, kind: RecordKind) -> Decimal {
        self.kind_totals.get(&kind).copied().unwrap_or_default()
    }
}

/// Result of bucketing a snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregation {
    pub granularity: Granularity,
    pub buckets: BTreeMap<String, BucketTotals>,
    /// Records without a usable timestamp
    pub unbucketable: usize,
    /// Timestamped records that fell outside the window
    pub out_of_window: usize,
    /// Records whose amount was not finite (or too large to sum) and counted as zero
    pub non_finite_amounts: usize,
}

impl Aggregation {
    pub fn get(&self, key: &str) -> Option<&BucketTotals> {
        self.buckets.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// All buckets folded into one
    pub fn combined(&self) -> BucketTotals {
        let mut total = BucketTotals::default();
        for bucket in self.buckets.values() {
            total.merge(bucket);
        }
        total
    }
}

/// Simple totals over every record, timestamped or not
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub net: Decimal,
    pub count: u64,
    pub kind_totals: BTreeMap<RecordKind, Decimal>,
}

/// Expense total for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub amount: Decimal,
    pub count: u64,
}

/// Exact amount of a record, or zero with a warning
fn usable_amount(record: &Record) -> (Decimal, bool) {
    match to_decimal(record.amount) {
        Some(amount) => (amount, true),
        None => {
            warn!(record_id = %record.id, amount = record.amount, "Unusable amount treated as zero");
            (Decimal::ZERO, false)
        }
    }
}

/// Aggregator for computing time-bucketed totals
pub struct Aggregator;

impl Aggregator {
    /// Bucket records by local calendar `granularity` inside `window`
    pub fn aggregate<Tz: TimeZone>(
        records: &[Record],
        granularity: Granularity,
        window: &Window,
        tz: &Tz,
    ) -> Aggregation {
        let mut aggregation = Aggregation {
            granularity,
            buckets: BTreeMap::new(),
            unbucketable: 0,
            out_of_window: 0,
            non_finite_amounts: 0,
        };

        for record in records {
            let Some(ms) = record.occurred_at_ms else {
                aggregation.unbucketable += 1;
                continue;
            };
            if !window.contains(ms) {
                aggregation.out_of_window += 1;
                continue;
            }
            let Some(date) = crate::models::local_date(ms, tz) else {
                aggregation.unbucketable += 1;
                continue;
            };

            let (amount, finite) = usable_amount(record);
            if !finite {
                aggregation.non_finite_amounts += 1;
            }

            aggregation
                .buckets
                .entry(granularity.key_for(date))
                .or_default()
                .add(record, amount);
        }

        debug!(
            granularity = %granularity,
            buckets = aggregation.buckets.len(),
            unbucketable = aggregation.unbucketable,
            out_of_window = aggregation.out_of_window,
            "Aggregated snapshot"
        );

        aggregation
    }

    /// Totals over every record, including ones without a timestamp
    pub fn totals(records: &[Record]) -> Totals {
        let mut totals = Totals::default();

        for record in records {
            let (amount, _) = usable_amount(record);
            match record.kind {
                RecordKind::Income => add(&mut totals.income_total, amount),
                RecordKind::Expense => add(&mut totals.expense_total, amount),
                _ => {}
            }
            add(totals.kind_totals.entry(record.kind).or_default(), amount);
            totals.count += 1;
        }

        totals.net = totals.income_total.saturating_sub(totals.expense_total);
        totals
    }

    /// Expense totals per category, largest first (ties by name)
    pub fn expense_by_category(records: &[Record]) -> Vec<CategoryTotal> {
        let mut by_category: BTreeMap<&str, (Decimal, u64)> = BTreeMap::new();

        for record in records.iter().filter(|r| r.is_expense()) {
            let (amount, _) = usable_amount(record);
            let entry = by_category.entry(record.category.as_str()).or_default();
            add(&mut entry.0, amount);
            entry.1 += 1;
        }

        let mut result: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, (amount, count))| CategoryTotal {
                category: category.to_string(),
                amount,
                count,
            })
            .collect();
        // BTreeMap iteration is already sorted by name, so a stable sort keeps name order on ties
        result.sort_by(|a, b| b.amount.cmp(&a.amount));
        result
    }

    /// Set of local days with at least one record of the given kinds
    ///
    /// `kinds = None` admits every kind.
    pub fn active_days<Tz: TimeZone>(
        records: &[Record],
        kinds: Option<&[RecordKind]>,
        tz: &Tz,
    ) -> BTreeSet<DayKey> {
        records
            .iter()
            .filter(|r| kinds.map_or(true, |k| k.contains(&r.kind)))
            .filter_map(|r| r.local_date(tz))
            .map(DayKey::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, LocalResult, NaiveDateTime, NaiveTime, Utc};

    fn ms(year: i32, month: u32, day: u32, hour: u32) -> i64 {
        Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn expense(id: &str, amount: f64, category: &str, at: i64) -> Record {
        Record::new(id, RecordKind::Expense, amount)
            .with_category(category)
            .at_ms(at)
    }

    fn income(id: &str, amount: f64, at: i64) -> Record {
        Record::new(id, RecordKind::Income, amount).at_ms(at)
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    // ========== aggregate() tests ==========

    #[test]
    fn test_aggregate_empty() {
        let result =
            Aggregator::aggregate(&[], Granularity::Month, &Window::unbounded(), &Utc);
        assert!(result.is_empty());
        assert_eq!(result.unbucketable, 0);
        assert_eq!(result.combined(), BucketTotals::default());
    }

    #[test]
    fn test_aggregate_by_month_may_scenario() {
        let records = vec![
            expense("a", 100.0, "Food", ms(2024, 5, 5, 12)),
            income("b", 50.0, ms(2024, 5, 5, 12)).with_category(""),
        ];
        let window = Window::for_month(2024, 5, &Utc).unwrap();

        let result = Aggregator::aggregate(&records, Granularity::Month, &window, &Utc);

        assert_eq!(result.buckets.len(), 1);
        let may = result.get("2024-05").unwrap();
        assert_eq!(may.expense_total, dec("100"));
        assert_eq!(may.income_total, dec("50"));
        assert_eq!(may.count, 2);
        assert_eq!(may.per_category_total.get("Food"), Some(&dec("100")));
        assert_eq!(may.net(), dec("-50"));
    }

    #[test]
    fn test_aggregate_excludes_out_of_window_and_untimestamped() {
        let records = vec![
            expense("in", 10.0, "Food", ms(2024, 5, 31, 12)),
            expense("before", 20.0, "Food", ms(2024, 4, 30, 12)),
            expense("after", 30.0, "Food", ms(2024, 6, 1, 12)),
            Record::new("no-ts", RecordKind::Expense, 40.0),
        ];
        let window = Window::for_month(2024, 5, &Utc).unwrap();

        let result = Aggregator::aggregate(&records, Granularity::Day, &window, &Utc);

        assert_eq!(result.buckets.len(), 1);
        assert_eq!(result.get("2024-05-31").unwrap().expense_total, dec("10"));
        assert_eq!(result.out_of_window, 2);
        assert_eq!(result.unbucketable, 1);
    }

    #[test]
    fn test_aggregate_window_is_half_open() {
        let window = Window::new(1_000, 2_000);
        let records = vec![
            expense("start", 1.0, "X", 1_000),
            expense("end", 2.0, "X", 2_000),
        ];

        let result = Aggregator::aggregate(&records, Granularity::Day, &window, &Utc);

        assert_eq!(result.combined().count, 1);
        assert_eq!(result.combined().expense_total, Decimal::ONE);
    }

    #[test]
    fn test_aggregate_local_midnight_boundary() {
        // 2024-05-01T00:00 at UTC+05:30 is 2024-04-30T18:30Z
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let midnight = local_midnight_ms(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(), &ist)
            .unwrap();
        let records = vec![
            expense("at-midnight", 5.0, "X", midnight),
            expense("just-before", 7.0, "X", midnight - 1),
        ];

        let result =
            Aggregator::aggregate(&records, Granularity::Day, &Window::unbounded(), &ist);

        assert_eq!(result.get("2024-05-01").unwrap().expense_total, dec("5"));
        assert_eq!(result.get("2024-04-30").unwrap().expense_total, dec("7"));
    }

    #[test]
    fn test_aggregate_non_finite_amount_counts_as_zero() {
        let records = vec![
            expense("nan", f64::NAN, "X", ms(2024, 5, 2, 9)),
            expense("ok", 3.0, "X", ms(2024, 5, 2, 9)),
        ];

        let result =
            Aggregator::aggregate(&records, Granularity::Day, &Window::unbounded(), &Utc);

        let day = result.get("2024-05-02").unwrap();
        assert_eq!(day.expense_total, dec("3"));
        assert_eq!(day.count, 2);
        assert_eq!(result.non_finite_amounts, 1);
    }

    #[test]
    fn test_aggregate_week_buckets() {
        let records = vec![
            expense("sun", 4.0, "X", ms(2024, 5, 5, 12)),
            expense("mon", 6.0, "X", ms(2024, 5, 6, 12)),
        ];

        let result =
            Aggregator::aggregate(&records, Granularity::Week, &Window::unbounded(), &Utc);

        assert_eq!(result.get("2024-W18").unwrap().expense_total, dec("4"));
        assert_eq!(result.get("2024-W19").unwrap().expense_total, dec("6"));
    }

    #[test]
    fn test_aggregate_wellness_kind_totals() {
        let records = vec![
            Record::new("m1", RecordKind::Meal, 1.0).at_ms(ms(2024, 5, 2, 8)),
            Record::new("w1", RecordKind::Water, 500.0).at_ms(ms(2024, 5, 2, 9)),
            Record::new("w2", RecordKind::Water, 250.0).at_ms(ms(2024, 5, 2, 15)),
        ];

        let result =
            Aggregator::aggregate(&records, Granularity::Day, &Window::unbounded(), &Utc);

        let day = result.get("2024-05-02").unwrap();
        assert_eq!(day.kind_total(RecordKind::Water), dec("750"));
        assert_eq!(day.kind_total(RecordKind::Meal), Decimal::ONE);
        assert_eq!(day.income_total, Decimal::ZERO);
        assert_eq!(day.expense_total, Decimal::ZERO);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = vec![
            expense("a", 12.25, "Food", ms(2024, 5, 3, 10)),
            expense("b", 7.5, "Fun", ms(2024, 5, 9, 10)),
            income("c", 900.0, ms(2024, 5, 1, 10)),
        ];
        let window = Window::unbounded();

        let first = Aggregator::aggregate(&records, Granularity::Day, &window, &Utc);
        let second = Aggregator::aggregate(&records, Granularity::Day, &window, &Utc);

        assert_eq!(first, second);
    }

    #[test]
    fn test_day_buckets_sum_to_month_to_the_cent() {
        let amounts = [82.64, 5.83, 30.42, 24.21, 73.8, 49.5, 94.83, 66.94];
        let records: Vec<Record> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                let day = 1 + (i as u32 % 3);
                expense(&format!("r{}", i), *amount, "Food", ms(2024, 5, day, 12))
            })
            .collect();
        let window = Window::for_month(2024, 5, &Utc).unwrap();

        let days = Aggregator::aggregate(&records, Granularity::Day, &window, &Utc);
        let month = Aggregator::aggregate(&records, Granularity::Month, &window, &Utc);

        let day_sum: Decimal = days.buckets.values().map(|b| b.expense_total).sum();
        let month_total = month.get("2024-05").unwrap().expense_total;
        assert_eq!(days.buckets.len(), 3);
        assert_eq!(day_sum, dec("428.17"));
        assert_eq!(month_total, day_sum);
        assert_eq!(to_f64(month_total), 428.17);
    }

    #[test]
    fn test_to_decimal_and_back() {
        assert_eq!(to_decimal(0.1), Some(dec("0.1")));
        assert_eq!(to_decimal(82.64), Some(dec("82.64")));
        assert_eq!(to_decimal(f64::NAN), None);
        assert_eq!(to_decimal(f64::INFINITY), None);
        assert_eq!(to_decimal(1e40), None);
        assert_eq!(to_f64(dec("0.3")), 0.3);
    }

    // ========== Window tests ==========

    #[test]
    fn test_window_for_month_december_rolls_year() {
        let window = Window::for_month(2023, 12, &Utc).unwrap();
        assert_eq!(window.start_ms, ms(2023, 12, 1, 0));
        assert_eq!(window.end_ms, ms(2024, 1, 1, 0));
        assert!(Window::for_month(2023, 13, &Utc).is_err());
    }

    #[test]
    fn test_window_for_iso_week() {
        let window = Window::for_iso_week(2024, 18, &Utc).unwrap();
        assert_eq!(window.start_ms, ms(2024, 4, 29, 0));
        assert_eq!(window.end_ms, ms(2024, 5, 6, 0));
        assert!(Window::for_iso_week(2024, 60, &Utc).is_err());
    }

    /// UTC until 2024-03-10, then one hour ahead: local 00:00-01:00 that day never happens
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn switch() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 10)
                .unwrap()
                .and_time(NaiveTime::MIN)
        }

        fn before() -> FixedOffset {
            FixedOffset::east_opt(0).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            if *local < Self::switch() {
                LocalResult::Single(Self::before())
            } else if *local < Self::switch() + Duration::hours(1) {
                LocalResult::None
            } else {
                LocalResult::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn test_window_starts_after_midnight_gap() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();

        let window = Window::for_dates(day, next, &MidnightGap).unwrap();

        // Local 01:00 is the first instant of the day, which is 00:00 UTC
        assert_eq!(window.start_ms, ms(2024, 3, 10, 0));
        // Local midnight on the 11th is 23:00 UTC, so the day is 23 hours long
        assert_eq!(window.end_ms, ms(2024, 3, 10, 23));

        let records = vec![expense("a", 40.0, "Food", ms(2024, 3, 10, 22))];
        let result = Aggregator::aggregate(&records, Granularity::Day, &window, &MidnightGap);
        assert_eq!(result.get("2024-03-10").unwrap().expense_total, dec("40"));
    }

    #[test]
    fn test_window_rejects_inverted_dates() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(Window::for_dates(start, end, &Utc).is_err());
    }

    #[test]
    fn test_window_preceding_days() {
        let window = Window::new(10 * MS_PER_DAY, 20 * MS_PER_DAY);
        let history = window.preceding_days(3);
        assert_eq!(history.start_ms, 7 * MS_PER_DAY);
        assert_eq!(history.end_ms, 10 * MS_PER_DAY);
        assert!(!history.contains(window.start_ms));
    }

    #[test]
    fn test_window_filter() {
        let window = Window::new(0, 100);
        let records = vec![
            expense("in", 1.0, "X", 50),
            expense("out", 1.0, "X", 150),
            Record::new("none", RecordKind::Expense, 1.0),
        ];
        let kept = window.filter(&records);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "in");
    }

    // ========== totals() / expense_by_category() tests ==========

    #[test]
    fn test_totals_include_untimestamped_records() {
        let records = vec![
            expense("a", 10.0, "Food", ms(2024, 5, 1, 12)),
            Record::new("b", RecordKind::Expense, 5.0),
            Record::new("c", RecordKind::Income, 40.0),
        ];

        let totals = Aggregator::totals(&records);

        assert_eq!(totals.expense_total, dec("15"));
        assert_eq!(totals.income_total, dec("40"));
        assert_eq!(totals.net, dec("25"));
        assert_eq!(totals.count, 3);
    }

    #[test]
    fn test_expense_by_category_sorted() {
        let records = vec![
            expense("a", 10.0, "Food", 0),
            expense("b", 30.0, "Rent", 0),
            expense("c", 10.0, "Books", 0),
            expense("d", 5.0, "Food", 0),
            income("e", 999.0, 0),
        ];

        let result = Aggregator::expense_by_category(&records);

        let names: Vec<&str> = result.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(names, vec!["Rent", "Food", "Books"]);
        assert_eq!(result[1].amount, dec("15"));
        assert_eq!(result[1].count, 2);
    }

    #[test]
    fn test_active_days_filters_kinds() {
        let records = vec![
            Record::new("w1", RecordKind::WorkoutCompleted, 30.0).at_ms(ms(2024, 5, 1, 7)),
            Record::new("w2", RecordKind::WorkoutCancelled, 0.0).at_ms(ms(2024, 5, 2, 7)),
            Record::new("w3", RecordKind::WorkoutCompleted, 45.0).at_ms(ms(2024, 5, 1, 19)),
            Record::new("w4", RecordKind::WorkoutCompleted, 20.0),
        ];

        let days = Aggregator::active_days(
            &records,
            Some(&[RecordKind::WorkoutCompleted]),
            &Utc,
        );
        let keys: Vec<String> = days.iter().map(|d| d.to_string()).collect();
        assert_eq!(keys, vec!["2024-05-01"]);

        let all = Aggregator::active_days(&records, None, &Utc);
        assert_eq!(all.len(), 2);
    }
}
