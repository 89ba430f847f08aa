//! Consecutive-day activity streaks.
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::activity::ActivityRecord;
use crate::time::local_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    /// Consecutive active days ending today; zero when today is inactive.
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Compute streaks from the local calendar dates of `history`.
#[must_use]
pub fn streaks(history: &[ActivityRecord], now: DateTime<Utc>, tz_offset_minutes: i32) -> Streaks {
    let dates: BTreeSet<NaiveDate> = history
        .iter()
        .map(|activity| activity.local_date(tz_offset_minutes))
        .collect();
    let today = local_date(now, tz_offset_minutes);
    Streaks {
        current_streak: current_run(&dates, today),
        longest_streak: longest_run(&dates),
    }
}

fn current_run(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut run = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor
        && dates.contains(&day)
    {
        run += 1;
        cursor = day.pred_opt();
    }
    run
}

fn longest_run(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in dates {
        run = match previous.and_then(|p| p.succ_opt()) {
            Some(next) if next == date => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }
    longest
}
