//! Figures shown above the transaction list for the filtered records.

use serde::Serialize;

use crate::expense::ExpenseRecord;

/// Count, sum and average of a list of expenses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ListSummary {
    /// The number of expenses.
    pub count: usize,
    /// The sum of the amounts.
    pub sum: f64,
    /// The mean amount, zero when the list is empty.
    pub average: f64,
}

/// Summarise `records`.
pub fn derive_summary(records: &[ExpenseRecord]) -> ListSummary {
    let count = records.len();
    let sum: f64 = records.iter().map(|record| record.amount).sum();
    let average = if count > 0 { sum / count as f64 } else { 0.0 };

    ListSummary {
        count,
        sum,
        average,
    }
}
