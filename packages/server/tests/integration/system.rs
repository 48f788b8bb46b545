use crate::common::{TestApp, routes};

#[tokio::test]
async fn root_reports_service_identity() {
    let app = TestApp::spawn().await;

    for path in [routes::ROOT, "/api/"] {
        let res = app.get(path).await;
        assert_eq!(res.status, 200, "{path}");
        assert_eq!(res.body["message"], "Lumina Gallery API");
        assert_eq!(res.body["version"], env!("CARGO_PKG_VERSION"));
    }
}

#[tokio::test]
async fn health_is_healthy() {
    let app = TestApp::spawn().await;
    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "healthy");
    assert!(res.body["timestamp"].as_str().is_some());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = TestApp::spawn().await;
    let res = app
        .get_with_header(routes::HEALTH, "Origin", "http://gallery.example")
        .await;

    assert_eq!(res.header("access-control-allow-origin"), Some("*"));
}

#[tokio::test]
async fn scalar_ui_is_served() {
    let app = TestApp::spawn().await;
    let res = app.get("/scalar").await;
    assert_eq!(res.status, 200);
}
