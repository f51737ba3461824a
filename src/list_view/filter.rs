//! Filtering the transaction list.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{category::Category, expense::ExpenseRecord};

/// Constraints on which expenses are listed. Unset fields impose no
/// constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Only expenses in this category.
    pub category: Option<Category>,
    /// Only expenses on or after this date.
    pub start_date: Option<Date>,
    /// Only expenses on or before this date.
    pub end_date: Option<Date>,
    /// Only expenses of at least this amount.
    pub min_amount: Option<f64>,
    /// Only expenses of at most this amount.
    pub max_amount: Option<f64>,
}

impl FilterSpec {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self == &FilterSpec::default()
    }

    /// Whether `record` satisfies every set field.
    ///
    /// The category is compared against the record's display category, so
    /// filtering by [Category::Other] also matches unrecognised categories. A
    /// record with an invalid date fails any date bound.
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        if let Some(category) = self.category
            && record.category.bucket() != category
        {
            return false;
        }

        if self.start_date.is_some() || self.end_date.is_some() {
            let Some(date) = record.date.as_date() else {
                return false;
            };

            if self.start_date.is_some_and(|start| date < start)
                || self.end_date.is_some_and(|end| date > end)
            {
                return false;
            }
        }

        !(self.min_amount.is_some_and(|min| record.amount < min)
            || self.max_amount.is_some_and(|max| record.amount > max))
    }
}

/// The records that satisfy `filter`, in their original order.
pub fn apply_filter(records: &[ExpenseRecord], filter: &FilterSpec) -> Vec<ExpenseRecord> {
    records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}
