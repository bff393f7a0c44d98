//! Feed grouping: notifications land in Today / Yesterday / Older buckets
//! by comparing local-midnight-normalized dates.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Today,
    Yesterday,
    Older,
}

pub fn bucket_for(date: NaiveDate, today: NaiveDate) -> Bucket {
    if date >= today {
        // Clock-skewed "future" notifications read as today's
        Bucket::Today
    } else if date == today.pred_opt().unwrap_or(today) {
        Bucket::Yesterday
    } else {
        Bucket::Older
    }
}

/// True when the date falls in the current local year, used by the feed to
/// drop the year from rendered timestamps.
pub fn same_year(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn same_day_is_today() {
        assert_eq!(bucket_for(d(2026, 8, 6), d(2026, 8, 6)), Bucket::Today);
    }

    #[test]
    fn previous_day_is_yesterday() {
        assert_eq!(bucket_for(d(2026, 8, 5), d(2026, 8, 6)), Bucket::Yesterday);
    }

    #[test]
    fn yesterday_across_month_boundary() {
        assert_eq!(bucket_for(d(2026, 7, 31), d(2026, 8, 1)), Bucket::Yesterday);
        assert_eq!(bucket_for(d(2025, 12, 31), d(2026, 1, 1)), Bucket::Yesterday);
    }

    #[test]
    fn two_days_back_is_older() {
        assert_eq!(bucket_for(d(2026, 8, 4), d(2026, 8, 6)), Bucket::Older);
        assert_eq!(bucket_for(d(2020, 1, 1), d(2026, 8, 6)), Bucket::Older);
    }

    #[test]
    fn future_dates_read_as_today() {
        assert_eq!(bucket_for(d(2026, 8, 7), d(2026, 8, 6)), Bucket::Today);
    }

    #[test]
    fn year_comparison() {
        assert!(same_year(d(2026, 1, 1), d(2026, 12, 31)));
        assert!(!same_year(d(2025, 12, 31), d(2026, 1, 1)));
    }
}
