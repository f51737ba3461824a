//! Settings shared by the binaries and the [ExpenseController](crate::ExpenseController).

use std::time::Duration;

use crate::list_view::FilterMode;

/// How long to wait for the store before giving up on a request.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// How many expenses the dashboard's recent list shows.
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// The timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// File path to the SQLite database.
    pub db_path: String,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Decides which calendar day "today" is for the dashboard.
    pub local_timezone: String,
    /// How long to wait for the store before reporting [Error::Timeout](crate::Error::Timeout).
    pub store_timeout: Duration,
    /// How many expenses the dashboard's recent list shows.
    pub recent_limit: usize,
    /// Whether filter edits apply straight away or wait for the user to apply
    /// them.
    pub filter_mode: FilterMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: "spendwise.db".to_owned(),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            recent_limit: DEFAULT_RECENT_LIMIT,
            filter_mode: FilterMode::Staged,
        }
    }
}
