//! Calendar period boundaries for habit tracking.
//!
//! # Responsibility
//! - Compute the canonical start instant of the daily/weekly period that
//!   contains a given instant.
//!
//! # Invariants
//! - Pure and deterministic in `(frequency, now)`.
//! - Boundaries follow the calendar of `now`'s own time zone, not UTC.
//!   Production callers pass `chrono::Local` instants.
//! - Weeks start on Monday.

use crate::model::habit::Frequency;
use chrono::{DateTime, Datelike, Days, LocalResult, NaiveDate, NaiveTime, TimeDelta, TimeZone};

/// Returns the start of the period containing `now`.
///
/// - `Daily`: local midnight of `now`'s calendar day.
/// - `Weekly`: local midnight of the Monday on or before `now`.
pub fn period_start<Tz: TimeZone>(frequency: Frequency, now: &DateTime<Tz>) -> DateTime<Tz> {
    let today = now.date_naive();
    let first_day = match frequency {
        Frequency::Daily => today,
        Frequency::Weekly => {
            let back = u64::from(now.weekday().num_days_from_monday());
            today.checked_sub_days(Days::new(back)).unwrap_or(today)
        }
    };
    start_of_day(&now.timezone(), first_day)
}

/// Returns the first instant of `date` in `tz`.
///
/// Ambiguous midnights resolve to the earliest instant. When midnight falls
/// inside a DST gap, the first valid local time after it is used.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Gaps are at most a few hours; step forward a quarter hour at a time.
            let mut candidate = midnight;
            for _ in 0..(4 * 24) {
                candidate += TimeDelta::minutes(15);
                if let Some(instant) = tz.from_local_datetime(&candidate).earliest() {
                    return instant;
                }
            }
            tz.from_utc_datetime(&midnight)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::period_start;
    use crate::model::habit::Frequency;
    use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc, Weekday};

    fn at(offset_hours: i32, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    fn assert_midnight(instant: &DateTime<FixedOffset>) {
        assert_eq!(instant.hour(), 0);
        assert_eq!(instant.minute(), 0);
        assert_eq!(instant.second(), 0);
        assert_eq!(instant.nanosecond(), 0);
    }

    #[test]
    fn daily_truncates_to_local_midnight_same_date() {
        for hour in [0, 1, 12, 23] {
            let now = at(2, 2024, 3, 6, hour, 59);
            let start = period_start(Frequency::Daily, &now);
            assert_midnight(&start);
            assert_eq!(start.date_naive(), now.date_naive());
            assert!(start <= now);
        }
    }

    #[test]
    fn weekly_maps_every_weekday_to_its_monday() {
        // 2024-03-04 is a Monday.
        let monday = at(0, 2024, 3, 4, 0, 0);
        for day in 4..=10 {
            let now = at(0, 2024, 3, day, 15, 30);
            let start = period_start(Frequency::Weekly, &now);
            assert_eq!(start, monday, "day {day}");
            assert_eq!(start.weekday(), Weekday::Mon);
        }
    }

    #[test]
    fn weekly_sunday_steps_back_six_days() {
        let sunday = at(0, 2024, 3, 10, 23, 59);
        let start = period_start(Frequency::Weekly, &sunday);
        assert_eq!(start, at(0, 2024, 3, 4, 0, 0));
        assert_eq!((sunday.date_naive() - start.date_naive()).num_days(), 6);
    }

    #[test]
    fn weekly_start_is_latest_monday_not_after_now() {
        let mut now = at(-5, 2023, 12, 25, 8, 0);
        for _ in 0..60 {
            let start = period_start(Frequency::Weekly, &now);
            assert_midnight(&start);
            assert_eq!(start.weekday(), Weekday::Mon);
            assert!(start <= now);
            assert!(now - start < chrono::TimeDelta::days(7));
            now += chrono::TimeDelta::hours(29);
        }
    }

    #[test]
    fn boundaries_follow_the_instant_time_zone_not_utc() {
        // Same instant: Monday 01:00 at +03:00 is Sunday 22:00 UTC.
        let plus_three = at(3, 2024, 3, 4, 1, 0);
        let utc = plus_three.with_timezone(&FixedOffset::east_opt(0).unwrap());

        let local_week = period_start(Frequency::Weekly, &plus_three);
        let utc_week = period_start(Frequency::Weekly, &utc);
        assert_ne!(local_week.timestamp_millis(), utc_week.timestamp_millis());
        assert_eq!(local_week, at(3, 2024, 3, 4, 0, 0));
    }

    #[test]
    fn weekly_crosses_month_and_year_boundaries() {
        // 2025-01-01 is a Wednesday; its Monday is 2024-12-30.
        let now = at(0, 2025, 1, 1, 9, 0);
        assert_eq!(period_start(Frequency::Weekly, &now), at(0, 2024, 12, 30, 0, 0));
    }

    #[test]
    fn midnight_inside_dst_gap_starts_at_first_valid_time() {
        use chrono_tz::America::Sao_Paulo;

        // Clocks jumped from 00:00 -03 to 01:00 -02 on 2018-11-04.
        let afternoon = Sao_Paulo.with_ymd_and_hms(2018, 11, 4, 15, 0, 0).unwrap();
        let late = Sao_Paulo.with_ymd_and_hms(2018, 11, 4, 23, 0, 0).unwrap();

        let start = period_start(Frequency::Daily, &afternoon);
        assert_eq!(start, Utc.with_ymd_and_hms(2018, 11, 4, 3, 0, 0).unwrap());
        assert_eq!(start.hour(), 1);
        assert_eq!(start, period_start(Frequency::Daily, &late));

        let next_day = Sao_Paulo.with_ymd_and_hms(2018, 11, 5, 0, 30, 0).unwrap();
        assert!(period_start(Frequency::Daily, &next_day) > start);
    }

    #[test]
    fn ambiguous_midnight_resolves_to_earliest_instant() {
        use chrono_tz::America::Havana;

        // Havana fell back from 01:00 -04 to 00:00 -05 on 2023-11-05,
        // so that midnight happened twice.
        let noon = Havana.with_ymd_and_hms(2023, 11, 5, 12, 0, 0).unwrap();
        let start = period_start(Frequency::Daily, &noon);

        assert_eq!(start, Utc.with_ymd_and_hms(2023, 11, 5, 4, 0, 0).unwrap());
        assert_eq!(start.hour(), 0);
        assert_eq!(start.date_naive(), noon.date_naive());
    }
}
