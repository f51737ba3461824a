//! Calendar helpers for the dashboard: period boundaries, bucket keys and
//! chart labels.
//!
//! Weeks start on Sunday everywhere in the crate.

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

/// The size of one bucket in a trailing time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// One bucket per calendar day, labelled like "Jan 5".
    Day,
    /// One bucket per calendar month, labelled like "Jan 2024".
    Month,
}

impl Granularity {
    /// The key of the bucket that `date` falls into.
    pub(crate) fn bucket_key(self, date: Date) -> Date {
        match self {
            Granularity::Day => date,
            Granularity::Month => month_start(date),
        }
    }

    /// The keys of the `window_length` buckets ending at the bucket containing
    /// `now`, oldest first.
    pub(crate) fn window(self, now: Date, window_length: usize) -> Vec<Date> {
        let end = self.bucket_key(now);

        (0..window_length)
            .rev()
            .map(|offset| match self {
                Granularity::Day => days_before(end, offset as i64),
                Granularity::Month => months_before(end, offset as i64),
            })
            .collect()
    }

    /// The chart label for the bucket with key `bucket`.
    pub(crate) fn label(self, bucket: Date) -> String {
        match self {
            Granularity::Day => format!("{} {}", month_abbrev(bucket.month()), bucket.day()),
            Granularity::Month => format!("{} {}", month_abbrev(bucket.month()), bucket.year()),
        }
    }
}

/// The Sunday on or before `date`.
pub fn week_start(date: Date) -> Date {
    days_before(date, date.weekday().number_days_from_sunday() as i64)
}

/// The first day of the month containing `date`.
pub fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

fn days_before(date: Date, days: i64) -> Date {
    date.checked_sub(Duration::days(days)).unwrap_or(Date::MIN)
}

fn months_before(month_start: Date, months: i64) -> Date {
    let index =
        month_start.year() as i64 * 12 + (u8::from(month_start.month()) as i64 - 1) - months;
    let year = index.div_euclid(12) as i32;
    let month = Month::try_from((index.rem_euclid(12) + 1) as u8).unwrap_or(Month::January);

    Date::from_calendar_date(year, month, 1).unwrap_or(Date::MIN)
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
