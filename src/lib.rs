//! Spendwise is a personal expense tracker.
//!
//! This library holds the core of the app:
//! - the [dashboard] figures computed from a user's expenses,
//! - the transaction [list_view] with filtering, sorting and summaries,
//! - the [ExpenseController] that keeps the list in sync with an
//!   [ExpenseStore] for the signed in user,
//! - and a SQLite backed store, [SQLiteStore].
//!
//! Rendering is left to the caller. The `report` binary prints the dashboard
//! or the transaction list as text or JSON.

#![warn(missing_docs)]

pub mod budget;
pub mod category;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod expense;
pub mod format;
pub mod list_view;
pub mod logging;
pub mod request;
pub mod session;
pub mod stores;
pub mod timezone;
pub mod user;

pub use config::AppConfig;
pub use controller::{ExpenseController, FetchOutcome};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use stores::{ExpenseStore, SQLiteStore};
