//! SQLite schema and queries for budget settings.

use rusqlite::{Connection, OptionalExtension, Row};

use crate::{
    Error,
    budget::{BudgetSetting, BudgetUpdate},
    db::{CreateTable, MapRow},
    user::UserId,
};

impl CreateTable for BudgetSetting {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS budget_setting (
                owner_id INTEGER PRIMARY KEY,
                monthly_budget REAL NOT NULL,
                weekly_budget REAL NOT NULL
            )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for BudgetSetting {
    type ReturnType = Self;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            owner_id: UserId::new(row.get(offset)?),
            monthly_budget: row.get(offset + 1)?,
            weekly_budget: row.get(offset + 2)?,
        })
    }
}

/// Retrieve the budget setting for `owner_id`, if one was saved.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_budget_setting(
    owner_id: UserId,
    connection: &Connection,
) -> Result<Option<BudgetSetting>, Error> {
    connection
        .prepare(
            "SELECT owner_id, monthly_budget, weekly_budget FROM budget_setting
             WHERE owner_id = :owner_id",
        )?
        .query_row(&[(":owner_id", &owner_id.as_i64())], BudgetSetting::map_row)
        .optional()
        .map_err(|error| error.into())
}

/// Create the budget setting for `owner_id` on first save, update it
/// afterwards. Fields the update leaves unset fall back to the saved value,
/// then to the defaults.
///
/// # Errors
/// This function will return a:
/// - [Error::Validation] if the update sets a non-positive budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn upsert_budget_setting(
    owner_id: UserId,
    update: BudgetUpdate,
    connection: &Connection,
) -> Result<BudgetSetting, Error> {
    update.validate()?;

    let current = get_budget_setting(owner_id, connection)?
        .unwrap_or_else(|| BudgetSetting::default_for(owner_id));
    let budget = update.apply_to(current);

    connection.execute(
        "INSERT INTO budget_setting (owner_id, monthly_budget, weekly_budget)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(owner_id) DO UPDATE SET
            monthly_budget = excluded.monthly_budget,
            weekly_budget = excluded.weekly_budget",
        (
            budget.owner_id.as_i64(),
            budget.monthly_budget,
            budget.weekly_budget,
        ),
    )?;

    Ok(budget)
}
