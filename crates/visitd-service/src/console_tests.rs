//! Tests for console command dispatch.

use super::*;

#[tokio::test]
async fn test_import_requires_a_file_name() {
    let result = import_visit_uker(None).await;
    assert_eq!(result.unwrap_err().to_string(), "File name is required");
}

#[tokio::test]
async fn test_import_rejects_an_empty_file_name() {
    let result = import_visit_uker(Some("")).await;
    assert_eq!(result.unwrap_err().to_string(), "File name is required");

    let result = import_visit_uker(Some("   ")).await;
    assert_eq!(result.unwrap_err().to_string(), "File name is required");
}

#[tokio::test]
async fn test_import_succeeds_with_a_file_name() {
    let result = import_visit_uker(Some("visits.xlsx")).await;
    assert!(result.is_ok());
}

/// The completion message is a single line: bracketed wall-clock
/// timestamp, fixed summary text, elapsed duration.
#[test]
fn test_completion_line_shape() {
    let line = completion_line(std::time::Duration::from_millis(1250));

    assert!(!line.contains('\n'));

    let (timestamp, rest) = line
        .strip_prefix('[')
        .and_then(|s| s.split_once(']'))
        .expect("line should start with a bracketed timestamp");
    chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S")
        .expect("timestamp should be YYYY-MM-DD HH:MM:SS");

    assert_eq!(
        rest,
        " Insert data Visit Uker executed successfully, no errors found. took: 1.25s"
    );
}
