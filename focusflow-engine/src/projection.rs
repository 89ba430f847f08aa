//! Lifetime projection of current leisure habits.
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityRecord, Category};
use crate::config::ProjectionCfg;
use crate::numbers::{minutes_to_hours, round_to};
use crate::time::local_date;

const DAYS_PER_YEAR: f64 = 365.0;
const HOURS_PER_DAY: f64 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeisureProjection {
    pub age: i32,
    pub has_birth_year: bool,
    pub remaining_years: i32,
    pub avg_daily_leisure_hours: f64,
    pub hours_per_year: f64,
    pub years_on_leisure: f64,
    pub percent_of_life: f64,
    pub today_leisure_hours: f64,
    pub leisure_limit_hours: f64,
    pub limit_exceeded: bool,
    pub warning_level: WarningLevel,
}

/// Project the recent leisure average over the user's remaining years.
#[must_use]
pub fn leisure_projection(
    history: &[ActivityRecord],
    birth_year: Option<i32>,
    now: DateTime<Utc>,
    tz_offset_minutes: i32,
    cfg: &ProjectionCfg,
) -> LeisureProjection {
    let age = birth_year.map_or(cfg.default_age, |year| now.year() - year);
    let remaining_years = (cfg.life_expectancy_years - age).max(0);
    let lookback_days = cfg.lookback_days.max(1);
    let since = now - Duration::days(i64::from(lookback_days));
    let today = local_date(now, tz_offset_minutes);

    let leisure = history.iter().filter(|a| a.category == Category::Leisure);
    let (recent_minutes, today_minutes) =
        leisure.fold((0u64, 0u64), |(recent, today_total), activity| {
            let minutes = u64::from(activity.minutes());
            (
                recent + if activity.timestamp >= since { minutes } else { 0 },
                today_total
                    + if activity.local_date(tz_offset_minutes) == today {
                        minutes
                    } else {
                        0
                    },
            )
        });

    let avg_daily_hours = minutes_to_hours(recent_minutes) / f64::from(lookback_days);
    let hours_per_year = avg_daily_hours * DAYS_PER_YEAR;
    let years_on_leisure = avg_daily_hours * f64::from(remaining_years) / HOURS_PER_DAY;
    let today_hours = minutes_to_hours(today_minutes);

    let warning_level = if years_on_leisure >= cfg.critical_years {
        WarningLevel::Critical
    } else if years_on_leisure >= cfg.warning_years {
        WarningLevel::Warning
    } else {
        WarningLevel::Info
    };

    LeisureProjection {
        age,
        has_birth_year: birth_year.is_some(),
        remaining_years,
        avg_daily_leisure_hours: round_to(avg_daily_hours, 1),
        hours_per_year: round_to(hours_per_year, 0),
        years_on_leisure: round_to(years_on_leisure, 1),
        percent_of_life: round_to(avg_daily_hours / HOURS_PER_DAY * 100.0, 1),
        today_leisure_hours: round_to(today_hours, 1),
        leisure_limit_hours: cfg.daily_leisure_limit_hours,
        limit_exceeded: today_hours > cfg.daily_leisure_limit_hours,
        warning_level,
    }
}
