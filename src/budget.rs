//! The per-user budget targets and how much of them has been spent.

use serde::{Deserialize, Serialize};

use crate::{Error, dashboard::SpendingSummary, user::UserId};

/// The monthly budget used when a user has never saved one.
pub const DEFAULT_MONTHLY_BUDGET: f64 = 3000.0;

/// The weekly budget used when a user has never saved one.
pub const DEFAULT_WEEKLY_BUDGET: f64 = DEFAULT_MONTHLY_BUDGET / 4.0;

/// A user's budget targets. There is at most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSetting {
    /// The user the budget belongs to.
    pub owner_id: UserId,
    /// How much the user plans to spend per calendar month.
    pub monthly_budget: f64,
    /// How much the user plans to spend per week.
    pub weekly_budget: f64,
}

impl BudgetSetting {
    /// The budget for a user that has not saved one yet.
    pub fn default_for(owner_id: UserId) -> Self {
        Self {
            owner_id,
            monthly_budget: DEFAULT_MONTHLY_BUDGET,
            weekly_budget: DEFAULT_WEEKLY_BUDGET,
        }
    }
}

/// The fields to change when saving a budget. Unset fields keep their current
/// (or default) value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetUpdate {
    /// The new monthly budget.
    pub monthly_budget: Option<f64>,
    /// The new weekly budget.
    pub weekly_budget: Option<f64>,
}

impl BudgetUpdate {
    /// Check that any amounts being set are positive, finite numbers.
    ///
    /// # Errors
    /// Returns [Error::Validation] naming the offending field.
    pub fn validate(&self) -> Result<(), Error> {
        for (field, value) in [
            ("monthly budget", self.monthly_budget),
            ("weekly budget", self.weekly_budget),
        ] {
            if let Some(value) = value
                && (!value.is_finite() || value <= 0.0)
            {
                return Err(Error::Validation(format!(
                    "{field} must be greater than zero, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Merge the update onto `current`.
    pub fn apply_to(&self, current: BudgetSetting) -> BudgetSetting {
        BudgetSetting {
            owner_id: current.owner_id,
            monthly_budget: self.monthly_budget.unwrap_or(current.monthly_budget),
            weekly_budget: self.weekly_budget.unwrap_or(current.weekly_budget),
        }
    }
}

/// Spending measured against a user's budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetUsage {
    /// Spent so far this calendar month.
    pub monthly_spent: f64,
    /// The monthly budget.
    pub monthly_budget: f64,
    /// Budget left this month, negative when overspent.
    pub monthly_remaining: f64,
    /// The fraction of the monthly budget spent, zero when there is no budget.
    pub monthly_ratio: f64,
    /// Spent so far this week.
    pub weekly_spent: f64,
    /// The weekly budget.
    pub weekly_budget: f64,
    /// Budget left this week, negative when overspent.
    pub weekly_remaining: f64,
    /// The fraction of the weekly budget spent, zero when there is no budget.
    pub weekly_ratio: f64,
}

/// Compare this month's and this week's spending against `budget`.
pub fn budget_usage(summary: &SpendingSummary, budget: &BudgetSetting) -> BudgetUsage {
    BudgetUsage {
        monthly_spent: summary.this_month,
        monthly_budget: budget.monthly_budget,
        monthly_remaining: budget.monthly_budget - summary.this_month,
        monthly_ratio: ratio(summary.this_month, budget.monthly_budget),
        weekly_spent: summary.this_week,
        weekly_budget: budget.weekly_budget,
        weekly_remaining: budget.weekly_budget - summary.this_week,
        weekly_ratio: ratio(summary.this_week, budget.weekly_budget),
    }
}

fn ratio(spent: f64, budget: f64) -> f64 {
    if budget > 0.0 { spent / budget } else { 0.0 }
}
