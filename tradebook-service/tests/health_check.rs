//! Health, readiness, and metrics endpoint tests.

mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_works() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let response = app.get("/health").await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "tradebook-service");
}

#[tokio::test]
async fn readiness_check_works() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let response = app.get("/ready").await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn metrics_endpoint_renders_prometheus_text() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    // Touch the database so the query-duration histogram has a sample.
    app.create_supplier("Metrics Farm", "Other").await;

    let response = app.get("/metrics").await;
    assert_eq!(response.status().as_u16(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("tradebook_db_query_duration_seconds"));
}
