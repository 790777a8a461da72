//! Streak calculator
//!
//! A streak is the number of consecutive calendar days, walking backward from
//! a reference day, present in a set of active days.

use std::collections::BTreeSet;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::models::DayKey;

/// Upper bound on the backward walk (about ten years)
pub const DEFAULT_LOOKBACK_CAP: u32 = 3650;

/// Current streak ending on `as_of`
///
/// The walk starts at `as_of` itself, so a day that is not (yet) active
/// yields 0 even if every previous day was active.
pub fn compute_streak(active_days: &BTreeSet<DayKey>, as_of: NaiveDate) -> u32 {
    compute_streak_with_cap(active_days, as_of, DEFAULT_LOOKBACK_CAP)
}

/// Current streak ending on `as_of`, walking back at most `cap` days
pub fn compute_streak_with_cap(
    active_days: &BTreeSet<DayKey>,
    as_of: NaiveDate,
    cap: u32,
) -> u32 {
    let mut streak = 0;
    let mut day = Some(DayKey::from(as_of));

    while let Some(current) = day {
        if streak >= cap || !active_days.contains(&current) {
            break;
        }
        streak += 1;
        day = current.pred();
    }

    streak
}

/// The current calendar day in `tz`
pub fn today_in<Tz: TimeZone>(tz: &Tz) -> NaiveDate {
    Utc::now().with_timezone(tz).date_naive()
}

/// Current streak ending today in `tz`
pub fn compute_streak_today<Tz: TimeZone>(
    active_days: &BTreeSet<DayKey>,
    tz: &Tz,
    cap: u32,
) -> u32 {
    compute_streak_with_cap(active_days, today_in(tz), cap)
}

/// Longest run of consecutive days anywhere in the set
pub fn longest_streak(active_days: &BTreeSet<DayKey>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<DayKey> = None;

    for day in active_days {
        run = match previous.and_then(|p| p.succ()) {
            Some(expected) if expected == *day => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(*day);
    }

    longest
}
