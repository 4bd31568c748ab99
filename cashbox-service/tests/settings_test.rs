mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn config_round_trip() {
    let app = TestApp::spawn().await;

    let response = app.put("/config/theme", &json!({ "value": "dark" })).await;
    assert_eq!(response.status().as_u16(), 200);

    let entry: Value = app.get("/config/theme").await.json().await.unwrap();
    assert_eq!(entry["key"], "theme");
    assert_eq!(entry["value"], "dark");

    app.put("/config/theme", &json!({ "value": "light" })).await;
    let all: Value = app.get("/config").await.json().await.unwrap();
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["value"], "light");
}

#[tokio::test]
async fn known_keys_are_validated() {
    let app = TestApp::spawn().await;

    let cases = [
        ("theme", json!("neon")),
        ("zoom", json!(3.0)),
        ("labels", json!({ "credit": 1 })),
    ];
    for (key, value) in cases {
        let response = app
            .put(&format!("/config/{}", key), &json!({ "value": value }))
            .await;
        assert_eq!(response.status().as_u16(), 400, "key {}", key);
    }

    let response = app
        .put("/config/labels", &json!({ "value": { "credit": "In", "debit": "Out" } }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn missing_config_key_is_404() {
    let app = TestApp::spawn().await;

    assert_eq!(app.get("/config/zoom").await.status().as_u16(), 404);
}

#[tokio::test]
async fn mutations_are_audited_with_actor() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk").await;
    let sales = app.create_category("Sales", "CR").await;
    app.record(&unit, &sales, "CR", "10", "2026-03-01").await;

    let logs: Value = app.get("/audit-logs").await.json().await.unwrap();
    let logs = logs.as_array().unwrap();
    let actions: Vec<&str> = logs.iter().map(|l| l["action"].as_str().unwrap()).collect();

    assert_eq!(
        actions,
        ["movement.create", "category.create", "business_unit.create"]
    );
    assert!(logs.iter().all(|l| l["actor"] == "test-user"));

    let limited: Value = app.get("/audit-logs?limit=1").await.json().await.unwrap();
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_business_unit_payload_is_422() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/business-units", &json!({ "name": "", "color": "blue" }))
        .await;

    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn duplicate_business_unit_name_is_409() {
    let app = TestApp::spawn().await;
    app.create_unit("Kiosk").await;

    let response = app
        .post("/business-units", &json!({ "name": "Kiosk", "color": "#000000" }))
        .await;

    assert_eq!(response.status().as_u16(), 409);
}
