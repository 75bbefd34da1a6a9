//! The response envelope: the fixed `{message, code, data}` JSON wrapper
//! for all API output.
//!
//! Two invariants hold for every constructor:
//! - the `code` field in the body always equals the HTTP status set on the
//!   response
//! - `data` is never null; an absent payload serializes as an empty list,
//!   so API consumers can always treat it as a collection

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Fixed JSON shape wrapping every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Human-readable outcome description.
    pub message: String,

    /// Mirror of the HTTP status code sent with the response.
    pub code: u16,

    /// Arbitrary payload; an empty list when there is nothing to return.
    pub data: Value,
}

impl Envelope {
    /// 200 with a caller-supplied payload.
    ///
    /// Payloads that fail to serialize degrade to the empty list rather
    /// than poisoning the response.
    pub fn success<T: Serialize>(data: T) -> Self {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            warn!(error = %e, "response payload failed to serialize; sending empty data");
            empty_data()
        });
        Self {
            message: "Success".to_string(),
            code: StatusCode::OK.as_u16(),
            data,
        }
    }

    /// 400 with no payload.
    pub fn bad_request() -> Self {
        Self {
            message: "Bad Request".to_string(),
            code: StatusCode::BAD_REQUEST.as_u16(),
            data: empty_data(),
        }
    }

    /// 401 with no payload.
    pub fn unauthorized() -> Self {
        Self {
            message: "Unauthorized".to_string(),
            code: StatusCode::UNAUTHORIZED.as_u16(),
            data: empty_data(),
        }
    }

    /// 403 with no payload.
    pub fn forbidden() -> Self {
        Self {
            message: "Forbidden".to_string(),
            code: StatusCode::FORBIDDEN.as_u16(),
            data: empty_data(),
        }
    }

    /// Caller-supplied message and status code, no payload.
    ///
    /// Out-of-range codes degrade to 500 so the body/status invariant
    /// cannot be broken by a bad caller.
    pub fn error(message: impl Into<String>, code: u16) -> Self {
        let code = StatusCode::from_u16(code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .as_u16();
        Self {
            message: message.into(),
            code,
            data: empty_data(),
        }
    }

    /// 500 with a caller-supplied message.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::error(message, StatusCode::INTERNAL_SERVER_ERROR.as_u16())
    }

    /// The HTTP status this envelope carries.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Canonical "no payload" value: an empty list, never null.
fn empty_data() -> Value {
    Value::Array(Vec::new())
}

#[cfg(test)]
#[path = "responses_tests.rs"]
mod tests;
