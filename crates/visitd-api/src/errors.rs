//! Error types for settings resolution, logging setup, and the HTTP service.

/// Settings resolution errors.
///
/// Construction of the settings store fails only when the operator has
/// supplied deliberate-but-broken configuration: a `.env` file that exists
/// but cannot be parsed, or a registered default that cannot be stored.
/// A missing `.env` file is not an error.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The configuration file exists but could not be parsed.
    ///
    /// The binary treats this as fatal: configuration is foundational and
    /// running with a half-read file would silently drop operator intent.
    #[error("malformed configuration file {path}: {message}")]
    Malformed { path: String, message: String },

    /// The underlying configuration store rejected a key or failed to
    /// merge sources.
    #[error("configuration resolution failed: {0}")]
    Resolution(#[from] config::ConfigError),
}

/// Process-logger initialization errors.
///
/// All variants are fatal to the binary: the service must not run
/// unobserved.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("failed to create log directory {path}: {message}")]
    CreateDirectory { path: String, message: String },

    /// The dated log file could not be opened for append.
    #[error("failed to open log file {path}: {message}")]
    OpenFile { path: String, message: String },

    /// A global subscriber was already installed.
    #[error("failed to install global subscriber: {message}")]
    Install { message: String },
}

/// Service-level errors surfaced by the HTTP lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("server failed: {message}")]
    ServerFailed { message: String },

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
}
