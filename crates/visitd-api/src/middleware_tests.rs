//! Tests for middleware construction and the list-parsing helpers.

use super::*;
use serial_test::serial;
use std::fs;

fn settings_from(contents: &str) -> Settings {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(&path, contents).unwrap();
    Settings::load(&path).unwrap()
}

fn default_settings() -> Settings {
    let dir = tempfile::tempdir().unwrap();
    Settings::load(&dir.path().join(".env")).unwrap()
}

// ============================================================================
// CORS layer
// ============================================================================

#[test]
#[serial]
fn test_cors_layer_built_by_default() {
    assert!(cors_layer(&default_settings()).is_some());
}

#[test]
#[serial]
fn test_cors_layer_skipped_when_disabled() {
    let settings = settings_from("MW_CORS_ENABLED=false\n");
    assert!(cors_layer(&settings).is_none());
}

#[test]
#[serial]
fn test_cors_layer_with_explicit_origin_list() {
    let settings = settings_from(
        "MW_CORS_ALLOWORIGINS=https://a.example,https://b.example\nMW_CORS_MAXAGE=600\n",
    );
    assert!(cors_layer(&settings).is_some());
}

// ============================================================================
// Basic auth layer
// ============================================================================

#[test]
#[serial]
fn test_basic_auth_layer_built_when_user_configured() {
    let settings = settings_from("BASIC_AUTH_USER=admin\nBASIC_AUTH_PASS=secret\n");
    assert!(basic_auth_layer(&settings).is_some());
}

#[test]
#[serial]
fn test_basic_auth_layer_skipped_when_disabled() {
    let settings =
        settings_from("MW_BASIC_AUTH_ENABLED=false\nBASIC_AUTH_USER=admin\nBASIC_AUTH_PASS=x\n");
    assert!(basic_auth_layer(&settings).is_none());
}

/// An empty user would require empty credentials; the layer is skipped
/// instead.
#[test]
#[serial]
fn test_basic_auth_layer_skipped_without_user() {
    assert!(basic_auth_layer(&default_settings()).is_none());
}

// ============================================================================
// Request-ID header resolution
// ============================================================================

#[test]
#[serial]
fn test_request_id_header_from_settings() {
    let settings = settings_from("MW_REQUESTID_HEADER=X-Correlation-ID\n");
    assert_eq!(request_id_header(&settings).as_str(), "x-correlation-id");
}

#[test]
#[serial]
fn test_request_id_header_falls_back_on_invalid_name() {
    let settings = settings_from("MW_REQUESTID_HEADER=\"not a header\"\n");
    assert_eq!(request_id_header(&settings).as_str(), "x-request-id");
}

// ============================================================================
// List parsing
// ============================================================================

#[test]
fn test_parse_methods_trims_and_drops_invalid_entries() {
    let methods = parse_methods("GET, POST ,PATCH,, NOT A METHOD");
    assert_eq!(
        methods,
        vec![Method::GET, Method::POST, Method::PATCH]
    );
}

#[test]
fn test_parse_methods_empty_input() {
    assert!(parse_methods("").is_empty());
    assert!(parse_methods(" , ,").is_empty());
}

#[test]
fn test_parse_header_names() {
    let headers = parse_header_names("Origin, Content-Type, Accept");
    assert_eq!(
        headers,
        vec![
            HeaderName::from_static("origin"),
            HeaderName::from_static("content-type"),
            HeaderName::from_static("accept"),
        ]
    );
}

#[test]
fn test_parse_origins_drops_invalid_values() {
    let origins = parse_origins("https://a.example, https://b.example, bad\u{7f}origin");
    assert_eq!(
        origins,
        vec![
            HeaderValue::from_static("https://a.example"),
            HeaderValue::from_static("https://b.example"),
        ]
    );
}
