//! Defines the crate level error type.

use crate::expense::ExpenseId;

/// The errors that may occur when working with expenses.
///
/// Errors from the external store are always surfaced to the caller as one of
/// these variants. The aggregation and list view functions never return an
/// error for a malformed individual record, they skip the record instead.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// Input reaching the core was malformed, e.g. a missing description or a
    /// non-positive amount on a new expense.
    #[error("invalid expense: {0}")]
    Validation(String),

    /// A date string could not be parsed as a `YYYY-MM-DD` calendar date.
    #[error("\"{0}\" is not a valid calendar date")]
    InvalidDate(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update an expense that does not exist or is owned by another
    /// user.
    #[error("tried to update an expense that is not in the store")]
    UpdateMissingExpense,

    /// There is no signed in user.
    #[error("no user is signed in")]
    Unauthenticated,

    /// The signed in user does not own the record they tried to change.
    #[error("the signed in user does not own this expense")]
    PermissionDenied,

    /// The store could not be reached.
    #[error("could not reach the expense store: {0}")]
    Network(String),

    /// The store did not respond in time.
    #[error("the expense store did not respond in time")]
    Timeout,

    /// Another mutation for the same expense has not completed yet.
    ///
    /// The caller should disable the controls for this expense until the
    /// earlier request resolves.
    #[error("a change to expense {0} is already in progress")]
    MutationInFlight(ExpenseId),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),
}

impl Error {
    /// Whether retrying the same request may succeed.
    ///
    /// The core never retries on its own, this only informs the presentation
    /// layer whether to offer a retry action.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Timeout | Error::DatabaseLockError
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}
