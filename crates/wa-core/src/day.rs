//! Target-day math for scheduled and on-demand passes.
//!
//! The scheduled trigger avoids weekends through its weekday range
//! (Tue-Sat firing with a one-day offset covers Mon-Fri work). The
//! on-demand path accepts an arbitrary days-ago offset, so it needs the
//! explicit [`is_weekend`] check instead. The two mechanisms guard
//! different call sites with different offset semantics and stay separate
//! on purpose.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc, Weekday};

/// Calendar day `days_ago` days before `now`, in the given fixed offset.
pub fn target_day(now: DateTime<Utc>, offset: FixedOffset, days_ago: u32) -> NaiveDate {
    (now.with_timezone(&offset) - Duration::days(i64::from(days_ago))).date_naive()
}

/// Whether the day falls on a Saturday or Sunday.
pub fn is_weekend(day: NaiveDate) -> bool {
    matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(3 * 3600).unwrap()
    }

    #[test]
    fn target_day_subtracts_days_in_local_offset() {
        // 2025-01-14 23:30 UTC is already 2025-01-15 in UTC+3.
        let now = Utc.with_ymd_and_hms(2025, 1, 14, 23, 30, 0).unwrap();
        assert_eq!(
            target_day(now, offset(), 1),
            NaiveDate::from_ymd_opt(2025, 1, 14).unwrap()
        );
        assert_eq!(
            target_day(now, offset(), 0),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn weekend_check_flags_saturday_and_sunday() {
        // 2025-01-18 is a Saturday.
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 1, 18).unwrap()));
        assert!(is_weekend(NaiveDate::from_ymd_opt(2025, 1, 19).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2025, 1, 17).unwrap()));
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()));
    }
}
