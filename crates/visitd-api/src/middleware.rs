//! Middleware construction from the settings store.
//!
//! Policy is driven entirely by `MW_*` and `BASIC_AUTH_*` settings; each
//! builder returns `None` when its toggle is off so the router simply
//! skips the layer.

use std::time::Duration;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};
#[allow(deprecated)]
use tower_http::auth::require_authorization::Basic;
use tower_http::validate_request::ValidateRequestHeaderLayer;
use tracing::{error, info, warn};

use crate::responses::Envelope;
use crate::settings::Settings;
use crate::AppState;

/// Build the CORS layer from the `MW_CORS_*` settings.
///
/// Returns `None` when `MW_CORS_ENABLED` is off.
pub fn cors_layer(settings: &Settings) -> Option<CorsLayer> {
    if !settings.get_bool("MW_CORS_ENABLED") {
        return None;
    }

    let origins = settings.get_string("MW_CORS_ALLOWORIGINS");
    let credentials = settings.get_bool("MW_CORS_ALLOWCREDENTIALS");

    let mut layer = CorsLayer::new()
        .allow_methods(AllowMethods::list(parse_methods(
            &settings.get_string("MW_CORS_ALLOWMETHODS"),
        )))
        .allow_headers(AllowHeaders::list(parse_header_names(
            &settings.get_string("MW_CORS_ALLOWHEADERS"),
        )))
        .allow_credentials(credentials);

    layer = if origins.trim() == "*" {
        if credentials {
            // The CORS protocol rejects a literal `*` combined with
            // credentials; mirroring the request origin preserves the
            // allow-everything intent.
            warn!("wildcard CORS origin with credentials; mirroring request origin");
            layer.allow_origin(AllowOrigin::mirror_request())
        } else {
            layer.allow_origin(Any)
        }
    } else {
        layer.allow_origin(AllowOrigin::list(parse_origins(&origins)))
    };

    let expose = parse_header_names(&settings.get_string("MW_CORS_EXPOSEHEADERS"));
    if !expose.is_empty() {
        layer = layer.expose_headers(ExposeHeaders::list(expose));
    }

    let max_age = settings.get_int("MW_CORS_MAXAGE");
    if max_age > 0 {
        layer = layer.max_age(Duration::from_secs(max_age as u64));
    }

    Some(layer)
}

/// Build the basic-auth layer from `BASIC_AUTH_USER` / `BASIC_AUTH_PASS`.
///
/// Returns `None` when `MW_BASIC_AUTH_ENABLED` is off, or — with a warning
/// — when no user is configured, since requiring empty credentials would
/// lock the service open in a confusing way.
// `ValidateRequestHeaderLayer::basic` is deprecated upstream; the single
// static credential pair is all this service needs.
#[allow(deprecated)]
pub fn basic_auth_layer(settings: &Settings) -> Option<ValidateRequestHeaderLayer<Basic<Body>>> {
    if !settings.get_bool("MW_BASIC_AUTH_ENABLED") {
        return None;
    }

    let user = settings.get_string("BASIC_AUTH_USER");
    if user.is_empty() {
        warn!("basic auth enabled but BASIC_AUTH_USER is empty; skipping the layer");
        return None;
    }

    let pass = settings.get_string("BASIC_AUTH_PASS");
    Some(ValidateRequestHeaderLayer::basic(&user, &pass))
}

/// Request logging middleware with correlation-ID tracking.
///
/// Extracts the correlation ID from the configured request header (or
/// generates one), logs request start and completion with structured
/// fields, and propagates the ID back through the response headers.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_name = request_id_header(&state.settings);
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(&header_name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(correlation_id.clone());

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = correlation_id.parse::<HeaderValue>() {
        response.headers_mut().insert(header_name, header_value);
    }

    let status = response.status();
    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "request completed"
        );
    }

    response
}

/// Reject every method except GET with a 405 envelope.
pub async fn get_only_middleware(request: Request, next: Next) -> Response {
    if request.method() != Method::GET {
        return Envelope::error("Method Not Allowed", 405).into_response();
    }
    next.run(request).await
}

/// Correlation-ID header name from `MW_REQUESTID_HEADER`, falling back to
/// `x-request-id` when the configured value is not a valid header name.
pub(crate) fn request_id_header(settings: &Settings) -> HeaderName {
    let configured = settings.get_string("MW_REQUESTID_HEADER");
    HeaderName::from_bytes(configured.as_bytes())
        .unwrap_or_else(|_| HeaderName::from_static("x-request-id"))
}

/// Parse a comma-separated method list, dropping unrecognized entries.
pub(crate) fn parse_methods(raw: &str) -> Vec<Method> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| Method::from_bytes(s.as_bytes()).ok())
        .collect()
}

/// Parse a comma-separated header-name list, dropping invalid entries.
pub(crate) fn parse_header_names(raw: &str) -> Vec<HeaderName> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderName::from_bytes(s.as_bytes()).ok())
        .collect()
}

/// Parse a comma-separated origin list, dropping invalid entries.
pub(crate) fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect()
}

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;
