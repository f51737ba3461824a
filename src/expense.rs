//! Defines the expense record and the types used to create and change one.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{
    Error,
    category::{Category, StoredCategory},
    user::UserId,
};

/// Alias for the integer type the store assigns to expenses.
pub type ExpenseId = i64;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
/// Returns [Error::InvalidDate] if `text` is not a valid calendar date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    Date::parse(text.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(text.to_owned()))
}

/// The date an expense occurred on, as held in the store.
///
/// Rows written by other clients may hold text that is not a calendar date.
/// Such records still count towards all-time totals but are left out of
/// anything bucketed by date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExpenseDate {
    /// A valid calendar date.
    Valid(Date),
    /// The raw text of a date that could not be parsed.
    Invalid(String),
}

impl ExpenseDate {
    /// Parse `text`, keeping the raw text if it is not a valid date.
    pub fn parse(text: &str) -> Self {
        match parse_date(text) {
            Ok(date) => ExpenseDate::Valid(date),
            Err(_) => ExpenseDate::Invalid(text.to_owned()),
        }
    }

    /// The calendar date, if valid.
    pub fn as_date(&self) -> Option<Date> {
        match self {
            ExpenseDate::Valid(date) => Some(*date),
            ExpenseDate::Invalid(_) => None,
        }
    }
}

impl From<Date> for ExpenseDate {
    fn from(date: Date) -> Self {
        ExpenseDate::Valid(date)
    }
}

impl From<String> for ExpenseDate {
    fn from(text: String) -> Self {
        match parse_date(&text) {
            Ok(date) => ExpenseDate::Valid(date),
            Err(_) => ExpenseDate::Invalid(text),
        }
    }
}

impl From<ExpenseDate> for String {
    fn from(date: ExpenseDate) -> Self {
        date.to_string()
    }
}

impl Display for ExpenseDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseDate::Valid(date) => date.fmt(f),
            ExpenseDate::Invalid(text) => f.write_str(text),
        }
    }
}

impl ToSql for ExpenseDate {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for ExpenseDate {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(ExpenseDate::parse)
    }
}

impl ToSql for StoredCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for StoredCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Null => Ok(StoredCategory::Unrecognized(String::new())),
            value => value.as_str().map(StoredCategory::from),
        }
    }
}

/// Money spent by a user on a given day.
///
/// To create a new `ExpenseRecord`, use [ExpenseRecord::build] and hand the
/// builder to an [ExpenseStore](crate::stores::ExpenseStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// The ID assigned by the store.
    pub id: ExpenseId,
    /// The user that owns the expense.
    pub owner_id: UserId,
    /// The amount of money spent, normally positive.
    pub amount: f64,
    /// A text description of what the money was spent on.
    pub description: String,
    /// The category as held in the store.
    pub category: StoredCategory,
    /// When the expense happened. This is not the same as `created_at`.
    pub date: ExpenseDate,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last edited, if ever.
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl ExpenseRecord {
    /// Create a new expense.
    ///
    /// Shortcut for [NewExpense] for discoverability.
    pub fn build(amount: f64, date: Date, description: &str) -> NewExpense {
        NewExpense {
            amount,
            date,
            description: description.trim().to_owned(),
            category: StoredCategory::Known(Category::Other),
        }
    }
}

/// The fields needed to create an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The amount spent, must be greater than zero.
    pub amount: f64,
    /// When the expense happened.
    pub date: Date,
    /// What the money was spent on, trimmed of surrounding whitespace.
    pub description: String,
    /// The category, defaults to [Category::Other].
    pub category: StoredCategory,
}

impl NewExpense {
    /// Set the category of the expense.
    pub fn category(mut self, category: impl Into<StoredCategory>) -> Self {
        self.category = category.into();
        self
    }

    /// Check the fields before the expense is sent to the store.
    ///
    /// # Errors
    /// Returns [Error::Validation] if the amount is not a positive, finite number.
    pub fn validate(&self) -> Result<(), Error> {
        validate_amount(self.amount)
    }
}

/// A partial update to an expense. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpensePatch {
    /// The new amount.
    pub amount: Option<f64>,
    /// The new description.
    pub description: Option<String>,
    /// The new category.
    pub category: Option<StoredCategory>,
    /// The new date.
    pub date: Option<Date>,
    /// When the change was made, normally set by the store.
    pub updated_at: Option<OffsetDateTime>,
}

impl ExpensePatch {
    /// Set the amount.
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the description. Surrounding whitespace is trimmed.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.trim().to_owned());
        self
    }

    /// Set the category.
    pub fn category(mut self, category: impl Into<StoredCategory>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the date.
    pub fn date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Check the fields before the patch is sent to the store.
    ///
    /// # Errors
    /// Returns [Error::Validation] if a new amount is set that is not a positive, finite number.
    pub fn validate(&self) -> Result<(), Error> {
        match self.amount {
            Some(amount) => validate_amount(amount),
            None => Ok(()),
        }
    }

    /// Copy the set fields onto `record`.
    pub fn apply_to(&self, record: &mut ExpenseRecord) {
        if let Some(amount) = self.amount {
            record.amount = amount;
        }
        if let Some(description) = &self.description {
            record.description = description.clone();
        }
        if let Some(category) = &self.category {
            record.category = category.clone();
        }
        if let Some(date) = self.date {
            record.date = ExpenseDate::Valid(date);
        }
        if let Some(updated_at) = self.updated_at {
            record.updated_at = Some(updated_at);
        }
    }
}

impl From<&ExpenseRecord> for ExpensePatch {
    /// A patch that overwrites every mutable field with the values in `record`.
    fn from(record: &ExpenseRecord) -> Self {
        Self {
            amount: Some(record.amount),
            description: Some(record.description.clone()),
            category: Some(record.category.clone()),
            date: record.date.as_date(),
            updated_at: record.updated_at,
        }
    }
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if !amount.is_finite() {
        return Err(Error::Validation(format!("amount must be a number, got {amount}")));
    }

    if amount <= 0.0 {
        return Err(Error::Validation(format!("amount must be greater than zero, got {amount}")));
    }

    Ok(())
}
