//! Sorting the transaction list.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::expense::ExpenseRecord;

/// The column the transaction list is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    /// When the expense happened.
    Date,
    /// How much was spent.
    Amount,
    /// The display category label, ignoring case.
    Category,
    /// The description, ignoring case.
    Description,
}

/// The order to sort in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortDirection {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

impl SortDirection {
    /// The opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// How the transaction list is ordered. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// The column to sort by.
    pub field: SortField,
    /// The order to sort in.
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::Date,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// Compare two records under this spec.
    pub fn compare(&self, a: &ExpenseRecord, b: &ExpenseRecord) -> Ordering {
        let ordering = match self.field {
            // Invalid dates order before every valid date.
            SortField::Date => a.date.as_date().cmp(&b.date.as_date()),
            SortField::Amount => a.amount.total_cmp(&b.amount),
            SortField::Category => compare_ignore_case(
                a.category.bucket().label(),
                b.category.bucket().label(),
            ),
            SortField::Description => compare_ignore_case(&a.description, &b.description),
        };

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Sort `records` by `sort`. Records that compare equal keep their relative
/// order.
pub fn apply_sort(mut records: Vec<ExpenseRecord>, sort: &SortSpec) -> Vec<ExpenseRecord> {
    records.sort_by(|a, b| sort.compare(a, b));
    records
}
