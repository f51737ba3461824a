//! Sets up the global tracing subscriber.

use std::{fs::OpenOptions, io, path::Path, sync::Arc};

use tracing_subscriber::{
    EnvFilter, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Install a subscriber that logs to stderr and, if `log_file` is given, also
/// appends to that file.
///
/// `default_level` applies when `RUST_LOG` is not set. Logs go to stderr so
/// that they never mix with report output on stdout.
///
/// # Errors
/// Returns an error if the log file cannot be opened or a global subscriber
/// has already been installed.
pub fn setup_logging(default_level: LevelFilter, log_file: Option<&Path>) -> io::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    let stderr_log = fmt::layer().pretty().with_writer(io::stderr);

    let file_log = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;

            Some(
                fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_log)
        .with(file_log)
        .try_init()
        .map_err(io::Error::other)
}
