//! Timezone offset helpers.
//!
//! Offsets follow the browser convention: minutes to add to local time to get
//! UTC, so UTC-5 is `+300` and UTC+2 is `-120`. Nothing in this crate reads the
//! system clock; every "now" is injected by the caller.
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};

fn offset(tz_offset_minutes: i32) -> Duration {
    Duration::minutes(i64::from(tz_offset_minutes))
}

/// Local wall-clock instant for a UTC instant, expressed as a naive UTC value.
#[must_use]
pub fn to_local(instant: DateTime<Utc>, tz_offset_minutes: i32) -> DateTime<Utc> {
    instant - offset(tz_offset_minutes)
}

/// Local calendar date for a UTC instant.
#[must_use]
pub fn local_date(instant: DateTime<Utc>, tz_offset_minutes: i32) -> NaiveDate {
    to_local(instant, tz_offset_minutes).date_naive()
}

/// Local hour of day (0-23) for a UTC instant.
#[must_use]
pub fn local_hour(instant: DateTime<Utc>, tz_offset_minutes: i32) -> u32 {
    to_local(instant, tz_offset_minutes).hour()
}

/// UTC instant at which the given local date begins.
#[must_use]
pub fn local_midnight_utc(date: NaiveDate, tz_offset_minutes: i32) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc() + offset(tz_offset_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn offsets_follow_browser_convention() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 1, 3, 30, 0).unwrap();
        assert_eq!(local_hour(instant, 300), 22);
        assert_eq!(local_date(instant, 300), NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
        assert_eq!(local_hour(instant, -120), 5);
    }

    #[test]
    fn local_midnight_round_trips_to_utc() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let start = local_midnight_utc(date, 300);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 2, 5, 0, 0).unwrap());
        assert_eq!(local_date(start, 300), date);
    }
}
