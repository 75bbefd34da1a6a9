//! Process-wide structured logging with dual stdout + dated-file output.
//!
//! Installed exactly once at startup. The stdout sink is human-readable;
//! the file sink is JSON, written to
//! `<LOG_DIRECTORY>/<APP_NAME>-<YYYY-MM-DD>.log` with the date fixed at
//! initialization time. Files are append-only; rotation happens only by
//! date-in-filename across process restarts, never by size.
//!
//! Initialization failure is fatal to the binary: the service must not run
//! unobserved.

use std::fs::{self, OpenOptions};
use std::path::Path;

use chrono::NaiveDate;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::errors::LoggingError;
use crate::settings::Settings;

/// Keeps the non-blocking file writer alive for the process lifetime.
///
/// Dropping the guard flushes and stops the background writer, so the
/// binary holds it until exit.
#[derive(Debug)]
pub struct LogGuard {
    _file: WorkerGuard,
}

/// Install the global subscriber: stdout + dated log file.
///
/// The level comes from the `LOG_LEVEL` setting unless `RUST_LOG` is set
/// in the environment, which wins. Log records carry an ISO-8601
/// timestamp, level, message, and caller (file/line); no stack traces.
pub fn init(settings: &Settings) -> Result<LogGuard, LoggingError> {
    let directory = settings.get_string("LOG_DIRECTORY");
    let app_name = settings.get_string("APP_NAME");

    fs::create_dir_all(&directory).map_err(|e| LoggingError::CreateDirectory {
        path: directory.clone(),
        message: e.to_string(),
    })?;

    let path = Path::new(&directory).join(dated_file_name(
        &app_name,
        chrono::Local::now().date_naive(),
    ));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| LoggingError::OpenFile {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let (file_writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.get_string("LOG_LEVEL")));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_file(true)
                .with_line_number(true)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| LoggingError::Install {
            message: e.to_string(),
        })?;

    Ok(LogGuard { _file: guard })
}

/// File name for the given application and date, e.g. `visitd-2026-08-29.log`.
pub fn dated_file_name(app_name: &str, date: NaiveDate) -> String {
    format!("{}-{}.log", app_name, date.format("%Y-%m-%d"))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
