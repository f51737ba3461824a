//! Expense aggregation for the dashboard cards and charts.
//!
//! Every function here is a pure transformation of already fetched records.
//! Records whose date is not a valid calendar date are counted in the
//! all-time total and in the category breakdown, but never in anything
//! bucketed by date.

use std::collections::HashMap;

use serde::Serialize;
use time::Date;

use crate::{
    category::Category,
    dashboard::window::{Granularity, month_start, week_start},
    expense::ExpenseRecord,
};

/// Headline spending figures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SpendingSummary {
    /// Spent across every record.
    pub total: f64,
    /// Spent on or after the first day of the current month.
    pub this_month: f64,
    /// Spent on or after the start of the current week.
    pub this_week: f64,
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    /// The category.
    pub category: Category,
    /// The sum of the amounts in the category.
    pub total: f64,
}

/// One bucket of a trailing time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// The chart label for the bucket, e.g. "Jan 5" or "Jan 2024".
    pub label: String,
    /// The sum of the amounts in the bucket, zero if there were none.
    pub total: f64,
}

/// Sum the records overall, for the month containing `now` and for the week
/// containing `now`.
pub fn summarize(records: &[ExpenseRecord], now: Date) -> SpendingSummary {
    let month_start = month_start(now);
    let week_start = week_start(now);

    let mut summary = SpendingSummary::default();
    let mut undated = 0;

    for record in records {
        summary.total += record.amount;

        let Some(date) = record.date.as_date() else {
            undated += 1;
            continue;
        };

        if date >= month_start {
            summary.this_month += record.amount;
        }

        if date >= week_start {
            summary.this_week += record.amount;
        }
    }

    if undated > 0 {
        tracing::warn!(
            "{undated} expense(s) with an invalid date were left out of the monthly and weekly totals"
        );
    }

    summary
}

/// Sum the records by category, largest total first.
///
/// Categories with equal totals keep the order they were first seen in.
pub fn by_category(records: &[ExpenseRecord]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();

    for record in records {
        let category = record.category.bucket();

        match totals.iter_mut().find(|entry| entry.category == category) {
            Some(entry) => entry.total += record.amount,
            None => totals.push(CategoryTotal {
                category,
                total: record.amount,
            }),
        }
    }

    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

/// Sum the records into the `window_length` day or month buckets ending at the
/// bucket containing `now`, oldest first.
///
/// Every bucket in the window is present even if nothing was spent in it.
/// Records outside the window are ignored.
pub fn trailing_series(
    records: &[ExpenseRecord],
    now: Date,
    granularity: Granularity,
    window_length: usize,
) -> Vec<SeriesPoint> {
    let buckets = granularity.window(now, window_length);
    let mut totals: HashMap<Date, f64> = buckets.iter().map(|bucket| (*bucket, 0.0)).collect();

    for record in records {
        let Some(date) = record.date.as_date() else {
            continue;
        };

        if let Some(total) = totals.get_mut(&granularity.bucket_key(date)) {
            *total += record.amount;
        }
    }

    buckets
        .into_iter()
        .map(|bucket| SeriesPoint {
            label: granularity.label(bucket),
            total: totals.get(&bucket).copied().unwrap_or(0.0),
        })
        .collect()
}

/// The `limit` most recent records, newest first.
///
/// Records are ordered by date then by creation time. Records with an invalid
/// date come last.
pub fn recent(records: &[ExpenseRecord], limit: usize) -> Vec<ExpenseRecord> {
    let mut sorted: Vec<&ExpenseRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.date
            .as_date()
            .cmp(&a.date.as_date())
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    sorted.into_iter().take(limit).cloned().collect()
}
