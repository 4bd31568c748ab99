mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn report_is_standalone_html() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk <North>").await;
    let sales = app.create_category("Sales", "CR").await;
    let supplies = app.create_category("Supplies", "DB").await;

    app.record(&unit, &sales, "CR", "150", "2026-03-10").await;
    app.post(
        "/movements",
        &json!({
            "business_unit_id": unit,
            "movement_type": "DB",
            "category_id": supplies,
            "amount": "40",
            "description": "<b>bleach</b>",
            "transaction_date": "2026-03-11",
        }),
    )
    .await;
    app.record(&unit, &sales, "CR", "999", "2026-04-01").await;

    let response = app
        .get(&format!(
            "/reports/movements?business_unit_id={}&from=2026-03-01&to=2026-03-31&granularity=monthly",
            unit
        ))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let html = response.text().await.unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Kiosk &lt;North&gt;"));
    assert!(html.contains("&lt;b&gt;bleach&lt;/b&gt;"));
    assert!(html.contains("$150.00"));
    assert!(html.contains("$110.00"));
    assert!(html.contains("<td>Debit</td>"));
    assert!(!html.contains("$999.00"));
}

#[tokio::test]
async fn global_report_covers_all_units() {
    let app = TestApp::spawn().await;
    let kiosk = app.create_unit("Kiosk").await;
    let bar = app.create_unit("Bar").await;
    let sales = app.create_category("Sales", "CR").await;

    app.record(&kiosk, &sales, "CR", "10", "2026-03-10").await;
    app.record(&bar, &sales, "CR", "20", "2026-03-10").await;

    let html = app
        .get("/reports/movements?from=2026-03-01&to=2026-03-31&title=Monthly%20close")
        .await
        .text()
        .await
        .unwrap();

    assert!(html.contains("<title>Monthly close</title>"));
    assert!(html.contains("All business units"));
    assert!(html.contains("$30.00"));
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/reports/movements?from=2026-03-31&to=2026-03-01")
        .await;

    assert_eq!(response.status().as_u16(), 400);
}
