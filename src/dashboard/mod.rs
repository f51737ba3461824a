//! Dashboard module
//!
//! Turns a user's expenses into the figures shown on the dashboard: headline
//! totals, the category breakdown, trend series and budget usage.

mod aggregation;
mod window;

pub use aggregation::{
    CategoryTotal, SeriesPoint, SpendingSummary, by_category, recent, summarize, trailing_series,
};
pub use window::{Granularity, month_start, week_start};

use serde::Serialize;
use time::Date;

use crate::{
    budget::{BudgetSetting, BudgetUsage, budget_usage},
    expense::ExpenseRecord,
};

/// The number of days shown in the daily trend chart.
pub const DAILY_WINDOW: usize = 7;

/// The number of months shown in the monthly trend chart.
pub const MONTHLY_WINDOW: usize = 6;

/// Everything the dashboard renders, computed in one pass from the same
/// records so the panels never disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// The date the figures were computed for.
    pub as_of: Date,
    /// Headline totals.
    pub summary: SpendingSummary,
    /// Spending per category, largest first.
    pub categories: Vec<CategoryTotal>,
    /// Spending per day over the last [DAILY_WINDOW] days.
    pub daily: Vec<SeriesPoint>,
    /// Spending per month over the last [MONTHLY_WINDOW] months.
    pub monthly: Vec<SeriesPoint>,
    /// The most recent expenses.
    pub recent: Vec<ExpenseRecord>,
    /// The user's budget, or the defaults if they never saved one.
    pub budget: BudgetSetting,
    /// This month's and this week's spending against the budget.
    pub budget_usage: BudgetUsage,
}

impl Dashboard {
    /// Compute the dashboard for `records` as of `now`.
    pub fn build(
        records: &[ExpenseRecord],
        budget: BudgetSetting,
        now: Date,
        recent_limit: usize,
    ) -> Self {
        let summary = summarize(records, now);

        Self {
            as_of: now,
            summary,
            categories: by_category(records),
            daily: trailing_series(records, now, Granularity::Day, DAILY_WINDOW),
            monthly: trailing_series(records, now, Granularity::Month, MONTHLY_WINDOW),
            recent: recent(records, recent_limit),
            budget_usage: budget_usage(&summary, &budget),
            budget,
        }
    }
}
