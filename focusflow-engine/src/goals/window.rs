use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Timeframe;
use crate::time::{local_date, local_midnight_utc};

/// The span of local days a goal is measured over, and how much of it has
/// elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalWindow {
    pub today: NaiveDate,
    pub start_date: NaiveDate,
    /// Activities at or after this instant fall inside the window.
    pub start_utc: DateTime<Utc>,
    pub days_passed: u32,
    pub total_days: u32,
}

impl GoalWindow {
    #[must_use]
    pub fn for_timeframe(timeframe: Timeframe, now: DateTime<Utc>, tz_offset_minutes: i32) -> Self {
        let today = local_date(now, tz_offset_minutes);
        let (start_date, days_passed, total_days) = match timeframe {
            Timeframe::Daily => (today, 1, 1),
            Timeframe::Weekly => {
                let weekday = today.weekday().num_days_from_monday();
                let start = today
                    .checked_sub_days(Days::new(u64::from(weekday)))
                    .unwrap_or(today);
                (start, (weekday + 1).max(1), 7)
            }
            Timeframe::Monthly => {
                let start = today.with_day(1).unwrap_or(today);
                (start, today.day(), days_in_month(start))
            }
        };
        Self {
            today,
            start_date,
            start_utc: local_midnight_utc(start_date, tz_offset_minutes),
            days_passed,
            total_days,
        }
    }

    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start_utc
    }
}

fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| u32::try_from((next - first).num_days()).ok())
        .unwrap_or(31)
}
