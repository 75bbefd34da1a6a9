//! The settings store: hierarchical key/value configuration for a process run.
//!
//! Values are resolved in priority order — registered defaults, then the
//! `.env` file in the working directory, then process-environment
//! overrides. Every key any other component reads has a default registered
//! here, so the typed accessors never signal "missing": absence of a file
//! or override degrades to the default silently.
//!
//! Keys are case-insensitive. The store is built once at process start and
//! never mutated afterwards.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment};

use crate::errors::SettingsError;

/// Dotenv-format configuration file looked up in the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Resolved configuration key/value set for a process run.
///
/// Wraps the layered [`config::Config`] store behind typed accessors that
/// mirror the resolver contract: a recognized key always resolves (to its
/// default when nothing overrode it), an unrecognized key resolves to the
/// type's zero value.
#[derive(Debug, Clone)]
pub struct Settings {
    inner: Config,
}

impl Settings {
    /// Build the settings store from defaults, `./.env`, and the process
    /// environment.
    ///
    /// A missing `.env` is tolerated; a malformed one is a
    /// [`SettingsError::Malformed`] the binary treats as fatal.
    pub fn new() -> Result<Self, SettingsError> {
        Self::load(Path::new(DEFAULT_ENV_FILE))
    }

    /// Build the settings store reading the dotenv file at `env_file`.
    ///
    /// Split out from [`Settings::new`] so tests can point the loader at a
    /// fixture directory instead of the process working directory.
    pub fn load(env_file: &Path) -> Result<Self, SettingsError> {
        let mut builder = register_defaults(Config::builder())?;

        // File values replace the registered defaults but still lose to
        // environment overrides layered on below.
        match dotenvy::from_path_iter(env_file) {
            Ok(entries) => {
                for entry in entries {
                    let (key, value) = entry.map_err(|e| SettingsError::Malformed {
                        path: env_file.display().to_string(),
                        message: e.to_string(),
                    })?;
                    builder = builder.set_default(key.to_lowercase(), value)?;
                }
            }
            Err(dotenvy::Error::Io(ref e)) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(SettingsError::Malformed {
                    path: env_file.display().to_string(),
                    message: e.to_string(),
                })
            }
        }

        let inner = builder.add_source(Environment::default()).build()?;

        Ok(Self { inner })
    }

    /// Resolve `key` as a string. Unrecognized keys resolve to `""`.
    pub fn get_string(&self, key: &str) -> String {
        self.inner.get_string(&key.to_lowercase()).unwrap_or_default()
    }

    /// Resolve `key` as an integer. Unrecognized or uncoercible values
    /// resolve to `0`.
    pub fn get_int(&self, key: &str) -> i64 {
        self.inner.get_int(&key.to_lowercase()).unwrap_or_default()
    }

    /// Resolve `key` as a boolean. Unrecognized or uncoercible values
    /// resolve to `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.inner.get_bool(&key.to_lowercase()).unwrap_or_default()
    }

    /// Resolve `key` as a duration.
    ///
    /// Bare integers are interpreted as whole seconds; anything else is
    /// parsed as a humantime expression (`"500ms"`, `"30s"`, `"1m"`).
    /// Unrecognized or unparseable values resolve to [`Duration::ZERO`].
    pub fn get_duration(&self, key: &str) -> Duration {
        parse_duration(&self.get_string(key))
    }
}

/// Parse a duration setting value.
///
/// Empty and unparseable inputs yield [`Duration::ZERO`], matching the
/// zero-value contract of the other accessors.
pub(crate) fn parse_duration(raw: &str) -> Duration {
    let raw = raw.trim();
    if raw.is_empty() {
        return Duration::ZERO;
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Duration::from_secs(secs);
    }
    humantime::parse_duration(raw).unwrap_or(Duration::ZERO)
}

/// Register the default for every recognized configuration key.
///
/// This table is the source of truth for the key namespace: a key absent
/// here is not part of the service's configuration surface. Components
/// must only read keys that appear below, which is what lets the accessors
/// drop the "not found" outcome entirely.
fn register_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    let builder = builder
        // Application
        .set_default("app_name", "visitd")?
        .set_default("app_url", "http://localhost:8080")?
        .set_default("app_env", "local")?
        .set_default("server_host", "0.0.0.0")?
        .set_default("server_port", 8080)?
        .set_default("log_level", "info")?
        .set_default("log_directory", "./storage/logs")?
        // Database (resolved and carried for future consumers; no
        // connection is made by this scaffold)
        .set_default("db_connection", "mysql")?
        .set_default("db_host", "localhost")?
        .set_default("db_port", 3306)?
        .set_default("db_username", "")?
        .set_default("db_password", "")?
        .set_default("db_database", "")?
        .set_default("db_max_conn", 25)?
        .set_default("db_max_idle_conn", 5)?
        .set_default("db_timeout", 30)?
        .set_default("db_timezone", "Asia/Jakarta")?
        .set_default("max_chunk_heartbeat", 12000)?
        .set_default("housekeeping_heartbeat", 3)?;

    let builder = builder
        // Password hasher
        .set_default("hasher_driver", "argon2id")?
        .set_default("hasher_memory", 131072)?
        .set_default("hasher_iterations", 4)?
        .set_default("hasher_parallelism", 4)?
        .set_default("hasher_saltlength", 16)?
        .set_default("hasher_keylength", 32)?
        .set_default("hasher_rounds", 10)?;

    let builder = builder
        // HTTP runtime options, consumed once at startup through the
        // server options record
        .set_default("http_strict_routing", false)?
        .set_default("http_case_sensitive", false)?
        .set_default("http_etag", false)?
        .set_default("http_get_only", false)?
        .set_default("http_body_limit", 10 * 1024 * 1024)?
        .set_default("http_concurrency", 262144)?
        .set_default("http_read_timeout", 0)?
        .set_default("http_write_timeout", 0)?
        .set_default("http_idle_timeout", 0)?
        .set_default("http_read_buffer_size", 4096)?
        .set_default("http_write_buffer_size", 4096)?
        .set_default("http_server_header", "")?
        .set_default("http_proxy_header", "")?
        .set_default("http_disable_keepalive", false)?
        .set_default("http_disable_startup_message", false)?
        .set_default("http_reduce_memory_usage", false)?
        .set_default("http_shutdown_timeout", 30)?;

    let builder = builder
        // Force HTTPS middleware
        .set_default("mw_force_https_enabled", false)?
        // Force trailing slash middleware
        .set_default("mw_force_trailing_slash_enabled", false)?
        // HSTS middleware
        .set_default("mw_hsts_enabled", false)?
        .set_default("mw_hsts_maxage", 31536000)?
        .set_default("mw_hsts_includesubdomains", true)?
        .set_default("mw_hsts_preload", false)?
        // Suppress WWW middleware
        .set_default("mw_suppress_www_enabled", true)?
        // Response cache middleware
        .set_default("mw_cache_enabled", false)?
        .set_default("mw_cache_expiration", "1m")?
        .set_default("mw_cache_cachecontrol", false)?
        // Compression middleware
        .set_default("mw_compress_enabled", false)?
        .set_default("mw_compress_level", 0)?
        // CORS middleware
        .set_default("mw_cors_enabled", true)?
        .set_default("mw_cors_alloworigins", "*")?
        .set_default("mw_cors_allowmethods", "GET,POST,HEAD,PUT,DELETE,PATCH")?
        .set_default("mw_cors_allowheaders", "Origin, Content-Type, Accept")?
        .set_default("mw_cors_allowcredentials", true)?
        .set_default("mw_cors_exposeheaders", "")?
        .set_default("mw_cors_maxage", 0)?
        // CSRF middleware
        .set_default("mw_csrf_enabled", false)?
        .set_default("mw_csrf_tokenlookup", "header:X-CSRF-Token")?
        .set_default("mw_csrf_cookie_name", "_csrf")?
        .set_default("mw_csrf_cookie_samesite", "Strict")?
        .set_default("mw_csrf_cookie_expires", "24h")?
        .set_default("mw_csrf_contextkey", "csrf")?
        // ETag middleware
        .set_default("mw_etag_enabled", false)?
        .set_default("mw_etag_weak", false)?
        // Favicon middleware
        .set_default("mw_favicon_enabled", false)?
        .set_default("mw_favicon_file", "")?
        .set_default("mw_favicon_cachecontrol", "public, max-age=31536000")?
        // Rate limiter middleware
        .set_default("mw_limiter_enabled", false)?
        .set_default("mw_limiter_max", 5)?
        .set_default("mw_limiter_duration", "1m")?
        // Panic recovery middleware
        .set_default("mw_recover_enabled", true)?
        // Request ID / request logging middleware
        .set_default("mw_requestid_enabled", false)?
        .set_default("mw_requestid_header", "X-Request-ID")?
        .set_default("mw_requestid_contextkey", "requestid")?
        // Basic auth middleware
        .set_default("mw_basic_auth_enabled", true)?
        .set_default("basic_auth_user", "")?
        .set_default("basic_auth_pass", "")?;

    Ok(builder)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
