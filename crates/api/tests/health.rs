//! Health endpoint smoke test.

mod common;

use axum::http::StatusCode;

use common::{build_test_app, get_json};

#[tokio::test]
async fn health_reports_ok_and_version() {
    let app = build_test_app();

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
