//! Implements the [ExpenseStore] on top of a SQLite database.

pub mod budget;
pub mod expense;

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{
    Error,
    budget::{BudgetSetting, BudgetUpdate},
    db::initialize,
    expense::{ExpenseId, ExpensePatch, ExpenseRecord, NewExpense},
    list_view::FilterSpec,
    stores::ExpenseStore,
    user::UserId,
};

/// Stores expenses and budget settings in a SQLite database.
///
/// Clones share the same connection.
#[derive(Debug, Clone)]
pub struct SQLiteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteStore {
    /// Create a new store for the SQLite `connection`.
    ///
    /// This function will modify the database by adding the expense and budget
    /// tables if they do not exist yet.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the tables could not be created.
    pub fn new(connection: Connection) -> Result<Self, Error> {
        initialize(&connection)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an [Error::SqlError] if the file could not be opened or the
    /// tables could not be created.
    pub fn open(path: &str) -> Result<Self, Error> {
        tracing::debug!("Opening SQLite database at {path}");
        Self::new(Connection::open(path)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)
    }
}

impl ExpenseStore for SQLiteStore {
    fn list_expenses(
        &self,
        owner_id: UserId,
        filter: Option<&FilterSpec>,
    ) -> Result<Vec<ExpenseRecord>, Error> {
        expense::list_expenses(owner_id, filter, &*self.lock()?)
    }

    fn insert_expense(
        &self,
        owner_id: UserId,
        new_expense: NewExpense,
    ) -> Result<ExpenseRecord, Error> {
        expense::insert_expense(owner_id, new_expense, &*self.lock()?)
    }

    fn update_expense(
        &self,
        id: ExpenseId,
        owner_id: UserId,
        patch: ExpensePatch,
    ) -> Result<ExpenseRecord, Error> {
        expense::update_expense(id, owner_id, patch, &*self.lock()?)
    }

    fn delete_expense(&self, id: ExpenseId, owner_id: UserId) -> Result<(), Error> {
        expense::delete_expense(id, owner_id, &*self.lock()?)
    }

    fn get_budget_setting(&self, owner_id: UserId) -> Result<Option<BudgetSetting>, Error> {
        budget::get_budget_setting(owner_id, &*self.lock()?)
    }

    fn upsert_budget_setting(
        &self,
        owner_id: UserId,
        update: BudgetUpdate,
    ) -> Result<BudgetSetting, Error> {
        budget::upsert_budget_setting(owner_id, update, &*self.lock()?)
    }
}
