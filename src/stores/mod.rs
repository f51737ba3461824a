//! Contains the trait for the external store that holds expenses and budget
//! settings, and a SQLite implementation of it.

pub mod sqlite;

pub use sqlite::SQLiteStore;

use crate::{
    Error,
    budget::{BudgetSetting, BudgetUpdate},
    expense::{ExpenseId, ExpensePatch, ExpenseRecord, NewExpense},
    list_view::FilterSpec,
    user::UserId,
};

/// Handles the creation, retrieval, editing and deletion of a user's expenses
/// and their budget setting.
///
/// Every call is scoped to `owner_id`: implementers must never read or change
/// another user's rows.
pub trait ExpenseStore {
    /// Retrieve the user's expenses, optionally narrowed by `filter`.
    ///
    /// When a filter is given the result must be exactly the records for which
    /// [FilterSpec::matches] is true.
    fn list_expenses(
        &self,
        owner_id: UserId,
        filter: Option<&FilterSpec>,
    ) -> Result<Vec<ExpenseRecord>, Error>;

    /// Create a new expense for the user.
    ///
    /// # Errors
    /// Implementers should return [Error::Validation] if `expense` fails
    /// [NewExpense::validate].
    fn insert_expense(&self, owner_id: UserId, expense: NewExpense)
    -> Result<ExpenseRecord, Error>;

    /// Change an expense owned by the user and return the updated record.
    ///
    /// # Errors
    /// Implementers should return [Error::UpdateMissingExpense] if the user
    /// owns no expense with `id`.
    fn update_expense(
        &self,
        id: ExpenseId,
        owner_id: UserId,
        patch: ExpensePatch,
    ) -> Result<ExpenseRecord, Error>;

    /// Permanently delete an expense owned by the user.
    ///
    /// Deleting an expense that does not exist, or that belongs to another
    /// user, succeeds without changing anything.
    fn delete_expense(&self, id: ExpenseId, owner_id: UserId) -> Result<(), Error>;

    /// Retrieve the user's budget setting, if they have saved one.
    fn get_budget_setting(&self, owner_id: UserId) -> Result<Option<BudgetSetting>, Error>;

    /// Create or update the user's budget setting.
    fn upsert_budget_setting(
        &self,
        owner_id: UserId,
        update: BudgetUpdate,
    ) -> Result<BudgetSetting, Error>;
}
