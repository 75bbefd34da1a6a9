//! Server options: an immutable snapshot of HTTP-runtime tuning parameters
//! derived once from the settings store.
//!
//! The record is built after every default has been registered and before
//! the runtime starts; the runtime consumes it once at construction and
//! never re-reads it. Translation is pure — no I/O, no failure path — so
//! building twice from the same store yields identical scalar fields.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::BoxError;

use crate::settings::Settings;

/// Callback invoked for errors funneled out of the fallible tower stack
/// (request timeouts, load shedding).
pub type ErrorHandler = Arc<dyn Fn(BoxError) -> Response + Send + Sync>;

/// Immutable snapshot of HTTP-runtime tuning parameters.
///
/// Scalar fields come straight from the `SERVER_*` / `HTTP_*` setting
/// groups; `error_handler` is the one non-scalar field and the only one
/// that can be swapped after construction (via
/// [`ServerOptions::set_error_handler`]).
#[derive(Clone)]
pub struct ServerOptions {
    /// Host the listener binds to.
    pub host: String,

    /// Port the listener binds to.
    pub port: u16,

    /// Deployment environment name (`local`, `staging`, `production`).
    pub environment: String,

    /// Externally visible base URL of the application.
    pub app_url: String,

    /// Value for the `Server` response header; empty disables the header.
    pub server_header: String,

    /// Treat `/foo` and `/foo/` as distinct routes.
    pub strict_routing: bool,

    /// Route matching is case sensitive.
    pub case_sensitive: bool,

    /// Emit ETag headers on responses.
    pub etag: bool,

    /// Reject all methods except GET.
    pub get_only: bool,

    /// Maximum accepted request body size in bytes.
    pub body_limit: usize,

    /// Maximum number of concurrently served requests.
    pub concurrency: usize,

    /// Per-request read timeout; zero disables the timeout.
    pub read_timeout: Duration,

    /// Per-request write timeout; zero disables the timeout.
    pub write_timeout: Duration,

    /// Keep-alive idle timeout; zero disables the timeout.
    pub idle_timeout: Duration,

    /// Transport read buffer size hint in bytes.
    pub read_buffer_size: usize,

    /// Transport write buffer size hint in bytes.
    pub write_buffer_size: usize,

    /// Header carrying the client address when behind a proxy; empty
    /// disables proxy-header resolution.
    pub proxy_header: String,

    /// Close connections after each response.
    pub disable_keepalive: bool,

    /// Suppress the startup banner log line.
    pub disable_startup_message: bool,

    /// Prefer lower memory usage over throughput.
    pub reduce_memory_usage: bool,

    /// Grace period for in-flight requests during shutdown.
    pub shutdown_timeout: Duration,

    /// Error-handling callback for the fallible middleware stack.
    pub error_handler: ErrorHandler,
}

impl ServerOptions {
    /// Derive the options record from the settings store.
    ///
    /// Pure translation: all inputs are already typed and defaulted by the
    /// store, so there is nothing to fail on.
    pub fn build(settings: &Settings) -> Self {
        Self {
            host: settings.get_string("SERVER_HOST"),
            // Out-of-range ports fall back to the default rather than
            // truncating to an arbitrary port.
            port: u16::try_from(settings.get_int("SERVER_PORT")).unwrap_or(8080),
            environment: settings.get_string("APP_ENV"),
            app_url: settings.get_string("APP_URL"),
            server_header: settings.get_string("HTTP_SERVER_HEADER"),
            strict_routing: settings.get_bool("HTTP_STRICT_ROUTING"),
            case_sensitive: settings.get_bool("HTTP_CASE_SENSITIVE"),
            etag: settings.get_bool("HTTP_ETAG"),
            get_only: settings.get_bool("HTTP_GET_ONLY"),
            body_limit: settings.get_int("HTTP_BODY_LIMIT").max(0) as usize,
            concurrency: settings.get_int("HTTP_CONCURRENCY").max(0) as usize,
            read_timeout: settings.get_duration("HTTP_READ_TIMEOUT"),
            write_timeout: settings.get_duration("HTTP_WRITE_TIMEOUT"),
            idle_timeout: settings.get_duration("HTTP_IDLE_TIMEOUT"),
            read_buffer_size: settings.get_int("HTTP_READ_BUFFER_SIZE").max(0) as usize,
            write_buffer_size: settings.get_int("HTTP_WRITE_BUFFER_SIZE").max(0) as usize,
            proxy_header: settings.get_string("HTTP_PROXY_HEADER"),
            disable_keepalive: settings.get_bool("HTTP_DISABLE_KEEPALIVE"),
            disable_startup_message: settings.get_bool("HTTP_DISABLE_STARTUP_MESSAGE"),
            reduce_memory_usage: settings.get_bool("HTTP_REDUCE_MEMORY_USAGE"),
            shutdown_timeout: settings.get_duration("HTTP_SHUTDOWN_TIMEOUT"),
            error_handler: Arc::new(default_error_handler),
        }
    }

    /// Replace the error-handling callback.
    ///
    /// The only mutation the record supports; must happen before the
    /// runtime consumes the record.
    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.error_handler = handler;
    }

    /// Socket address string the listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ServerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("app_url", &self.app_url)
            .field("server_header", &self.server_header)
            .field("strict_routing", &self.strict_routing)
            .field("case_sensitive", &self.case_sensitive)
            .field("etag", &self.etag)
            .field("get_only", &self.get_only)
            .field("body_limit", &self.body_limit)
            .field("concurrency", &self.concurrency)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("read_buffer_size", &self.read_buffer_size)
            .field("write_buffer_size", &self.write_buffer_size)
            .field("proxy_header", &self.proxy_header)
            .field("disable_keepalive", &self.disable_keepalive)
            .field("disable_startup_message", &self.disable_startup_message)
            .field("reduce_memory_usage", &self.reduce_memory_usage)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("error_handler", &"<callback>")
            .finish()
    }
}

/// Scalar-field equality; the callback is excluded (function identity is
/// not part of the record's value).
impl PartialEq for ServerOptions {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host
            && self.port == other.port
            && self.environment == other.environment
            && self.app_url == other.app_url
            && self.server_header == other.server_header
            && self.strict_routing == other.strict_routing
            && self.case_sensitive == other.case_sensitive
            && self.etag == other.etag
            && self.get_only == other.get_only
            && self.body_limit == other.body_limit
            && self.concurrency == other.concurrency
            && self.read_timeout == other.read_timeout
            && self.write_timeout == other.write_timeout
            && self.idle_timeout == other.idle_timeout
            && self.read_buffer_size == other.read_buffer_size
            && self.write_buffer_size == other.write_buffer_size
            && self.proxy_header == other.proxy_header
            && self.disable_keepalive == other.disable_keepalive
            && self.disable_startup_message == other.disable_startup_message
            && self.reduce_memory_usage == other.reduce_memory_usage
            && self.shutdown_timeout == other.shutdown_timeout
    }
}

/// Default error handler: status 500, `text/plain`, the raw error text.
///
/// Content-negotiated error bodies (JSON for API clients, HTML for
/// browsers) are deliberately not implemented; every funneled error gets
/// the same plain rendering.
pub fn default_error_handler(error: BoxError) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        error.to_string(),
    )
        .into_response()
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
