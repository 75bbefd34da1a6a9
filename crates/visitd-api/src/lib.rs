//! # visitd HTTP Service Library
//!
//! Scaffold for the branch-visit ingestion service:
//! - settings store resolving defaults, `.env`, and environment overrides
//! - server options record consumed once by the HTTP runtime
//! - `{message, code, data}` response envelopes
//! - process-wide logging to stdout and a dated log file
//! - middleware (CORS, basic auth, request logging) driven by settings
//! - server lifecycle with graceful shutdown on SIGINT/SIGTERM
//!
//! No business routes are defined; the only live endpoint is the `/health`
//! liveness probe.

pub mod errors;
pub mod logging;
pub mod middleware;
pub mod options;
pub mod responses;
pub mod settings;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::middleware as axum_middleware;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use errors::{LoggingError, ServiceError, SettingsError};
pub use logging::LogGuard;
pub use options::{default_error_handler, ErrorHandler, ServerOptions};
pub use responses::Envelope;
pub use settings::Settings;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
///
/// Both members follow the write-once-then-freeze discipline: populated at
/// startup before the listener accepts anything, read-only afterwards.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Resolved configuration for this process run.
    pub settings: Arc<Settings>,

    /// HTTP-runtime tuning parameters derived from the settings.
    pub options: ServerOptions,
}

impl AppState {
    /// Create application state from a resolved settings store.
    pub fn new(settings: Settings) -> Self {
        let options = ServerOptions::build(&settings);
        Self {
            settings: Arc::new(settings),
            options,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create the HTTP router with middleware wired from settings.
///
/// The route table is intentionally thin — `/health` only; business
/// endpoints belong to the absent handler/use-case layers.
pub fn create_router(state: AppState) -> Router {
    let mut router = Router::new().route("/health", get(handle_health));

    // Innermost layers first: each `layer` call wraps what is already
    // there, so later additions run earlier in the request path.
    if state.options.get_only {
        router = router.layer(axum_middleware::from_fn(middleware::get_only_middleware));
    }

    // Zero means "unlimited" for both knobs; a zero-permit semaphore
    // would stall every request and a zero-byte limit would reject
    // every non-empty body.
    if state.options.body_limit > 0 {
        router = router.layer(RequestBodyLimitLayer::new(state.options.body_limit));
    }
    if state.options.concurrency > 0 {
        router = router.layer(ConcurrencyLimitLayer::new(state.options.concurrency));
    }

    if let Some(auth) = middleware::basic_auth_layer(&state.settings) {
        router = router.layer(auth);
    }

    if let Some(cors) = middleware::cors_layer(&state.settings) {
        router = router.layer(cors);
    }

    if state.settings.get_bool("MW_COMPRESS_ENABLED") {
        router = router.layer(CompressionLayer::new());
    }

    if state.settings.get_bool("MW_REQUESTID_ENABLED") {
        router = router.layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::request_logging_middleware,
        ));
    }

    if !state.options.server_header.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&state.options.server_header) {
            router = router.layer(SetResponseHeaderLayer::overriding(header::SERVER, value));
        }
    }

    // A configured read timeout makes the stack fallible; errors funnel
    // through the options record's error-handler callback.
    if state.options.read_timeout > Duration::ZERO {
        let handler = state.options.error_handler.clone();
        router = router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| {
                    let handler = handler.clone();
                    async move { handler(err) }
                }))
                .timeout(state.options.read_timeout),
        );
    }

    router = router.layer(TraceLayer::new_for_http());

    router.with_state(state)
}

/// Bind the listener and serve until an interrupt triggers graceful
/// shutdown or the listener fails.
pub async fn start_server(state: AppState) -> Result<(), ServiceError> {
    let address = state.options.bind_address();
    let shutdown_timeout = state.options.shutdown_timeout;
    let startup_message = !state.options.disable_startup_message;

    let listener =
        TcpListener::bind(&address)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: address.clone(),
                message: e.to_string(),
            })?;

    if startup_message {
        info!(
            address = %address,
            environment = %state.options.environment,
            options = ?state.options,
            "starting HTTP server"
        );
    }

    let app = create_router(state);
    serve_with_shutdown(listener, app, shutdown_signal(shutdown_timeout)).await
}

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// Split out from [`start_server`] so tests can drive shutdown with a
/// channel instead of an OS signal. In-flight requests complete before the
/// future resolves; the completion path runs exactly once.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServiceError> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve when the process receives SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal(shutdown_timeout: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(
                timeout_secs = shutdown_timeout.as_secs(),
                "received SIGINT, initiating graceful shutdown"
            );
        },
        _ = terminate => {
            info!(
                timeout_secs = shutdown_timeout.as_secs(),
                "received SIGTERM, initiating graceful shutdown"
            );
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Liveness probe: a success envelope with basic service facts.
async fn handle_health(State(state): State<AppState>) -> Envelope {
    Envelope::success(serde_json::json!({
        "status": "ok",
        "environment": state.options.environment,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
