mod common;

use common::{d, dec, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn balance_is_credits_minus_debits() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk").await;
    let sales = app.create_category("Sales", "CR").await;
    let supplies = app.create_category("Supplies", "DB").await;

    app.record(&unit, &sales, "CR", "100.25", "2026-03-01").await;
    app.record(&unit, &sales, "CR", "50", "2026-03-05").await;
    app.record(&unit, &supplies, "DB", "20.25", "2026-03-06").await;

    let balance: Value = app
        .get(&format!("/balance?business_unit_id={}", unit))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(dec(&balance["total_credits"]), d("150.25"));
    assert_eq!(dec(&balance["total_debits"]), d("20.25"));
    assert_eq!(dec(&balance["balance"]), d("130"));
    assert_eq!(balance["ticket_count"], 2);

    let ranged: Value = app
        .get(&format!(
            "/balance?business_unit_id={}&from=2026-03-02&to=2026-03-05",
            unit
        ))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&ranged["balance"]), d("50"));
    assert_eq!(ranged["ticket_count"], 1);
}

#[tokio::test]
async fn global_balance_skips_inactive_units() {
    let app = TestApp::spawn().await;
    let kiosk = app.create_unit("Kiosk").await;
    let bar = app.create_unit("Bar").await;
    let sales = app.create_category("Sales", "CR").await;

    app.record(&kiosk, &sales, "CR", "10", "2026-03-01").await;
    app.record(&bar, &sales, "CR", "90", "2026-03-01").await;

    let global: Value = app.get("/balance").await.json().await.unwrap();
    assert_eq!(dec(&global["balance"]), d("100"));

    let response = app.delete(&format!("/business-units/{}", bar)).await;
    assert_eq!(response.status().as_u16(), 200);

    let global: Value = app.get("/balance").await.json().await.unwrap();
    assert_eq!(dec(&global["balance"]), d("10"));

    let units: Value = app.get("/balance/units").await.json().await.unwrap();
    let units = units.as_array().unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units[0]["name"], "Kiosk");
    assert_eq!(dec(&units[0]["balance"]), d("10"));
}

#[tokio::test]
async fn unit_balances_follow_display_order() {
    let app = TestApp::spawn().await;
    let a = app.create_unit("Alpha").await;
    let b = app.create_unit("Beta").await;
    let c = app.create_unit("Gamma").await;

    let response = app
        .post("/business-units/reorder", &json!({ "ids": [c, a, b] }))
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let units: Value = app.get("/balance/units").await.json().await.unwrap();
    let names: Vec<&str> = units
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Gamma", "Alpha", "Beta"]);
}

#[tokio::test]
async fn daily_sales_has_one_entry_per_day() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk").await;
    let sales = app.create_category("Sales", "CR").await;
    let supplies = app.create_category("Supplies", "DB").await;

    app.record(&unit, &sales, "CR", "10", "2026-03-10").await;
    app.record(&unit, &sales, "CR", "15", "2026-03-10").await;
    app.record(&unit, &sales, "CR", "7", "2026-03-08").await;
    app.record(&unit, &supplies, "DB", "99", "2026-03-08").await;

    let series: Value = app
        .get("/sales/daily?days=5&date=2026-03-10")
        .await
        .json()
        .await
        .unwrap();
    let series = series.as_array().unwrap();

    assert_eq!(series.len(), 5);
    assert_eq!(series[0]["date"], "2026-03-06");
    assert_eq!(series[4]["date"], "2026-03-10");
    assert_eq!(dec(&series[2]["total"]), d("7"));
    assert_eq!(dec(&series[3]["total"]), d("0"));
    assert_eq!(dec(&series[4]["total"]), d("25"));
}

#[tokio::test]
async fn daily_sales_rejects_out_of_range_days() {
    let app = TestApp::spawn().await;

    assert_eq!(app.get("/sales/daily?days=0").await.status().as_u16(), 400);
    assert_eq!(app.get("/sales/daily?days=367").await.status().as_u16(), 400);
}

#[tokio::test]
async fn sales_series_buckets_by_granularity() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk").await;
    let sales = app.create_category("Sales", "CR").await;

    app.record(&unit, &sales, "CR", "20", "2026-03-15").await;
    app.record(&unit, &sales, "CR", "30", "2026-01-20").await;

    let weekly: Value = app
        .get("/sales/series?granularity=weekly&date=2026-03-15")
        .await
        .json()
        .await
        .unwrap();
    let weekly = weekly.as_array().unwrap();
    assert_eq!(weekly.len(), 7);
    assert_eq!(weekly[6]["label"], "Sun");
    assert_eq!(dec(&weekly[6]["total"]), d("20"));

    let monthly: Value = app
        .get("/sales/series?granularity=monthly&date=2026-03-15")
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(monthly.as_array().unwrap().len(), 30);
    assert_eq!(monthly[29]["label"], "15/03");

    let annual: Value = app
        .get(&format!(
            "/sales/series?granularity=annual&date=2026-03-15&business_unit_id={}",
            unit
        ))
        .await
        .json()
        .await
        .unwrap();
    let annual = annual.as_array().unwrap();
    assert_eq!(annual.len(), 12);
    assert_eq!(annual[9]["label"], "Jan");
    assert_eq!(dec(&annual[9]["total"]), d("30"));
    assert_eq!(annual[11]["label"], "Mar");
}

#[tokio::test]
async fn activity_feed_names_units_and_categories() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk").await;
    let sales = app.create_category("Sales", "CR").await;

    app.record(&unit, &sales, "CR", "10", "2026-03-01").await;
    app.record(&unit, &sales, "CR", "11", "2026-03-02").await;

    let feed: Value = app.get("/activity?limit=1").await.json().await.unwrap();
    let feed = feed.as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["business_unit_name"], "Kiosk");
    assert_eq!(feed[0]["category_name"], "Sales");
    assert_eq!(feed[0]["sequence_number"], 2);
}

#[tokio::test]
async fn dashboard_summarises_today() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk").await;
    let sales = app.create_category("Sales", "CR").await;

    app.record(&unit, &sales, "CR", "12", "2026-03-15").await;
    app.record(&unit, &sales, "CR", "8", "2026-03-14").await;

    let dashboard: Value = app
        .get("/dashboard?date=2026-03-15")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(dashboard["date"], "2026-03-15");
    assert_eq!(dec(&dashboard["global"]["balance"]), d("20"));
    assert_eq!(dec(&dashboard["today_sales"]), d("12"));
    assert_eq!(dashboard["units"].as_array().unwrap().len(), 1);
    assert_eq!(dashboard["weekly_sales"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn carried_forward_balance_is_not_a_ticket() {
    let app = TestApp::spawn().await;
    let unit = app.create_unit("Kiosk").await;
    let sales = app.create_category("Sales", "CR").await;

    app.record(&unit, &sales, "CR", "100", "2026-03-10").await;
    let response = app
        .post(
            &format!("/business-units/{}/close-period", unit),
            &json!({ "label": "2026-03", "category_id": sales, "close_date": "2026-04-01" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);

    let balance: Value = app
        .get(&format!("/balance?business_unit_id={}", unit))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&balance["balance"]), d("100"));
    assert_eq!(balance["ticket_count"], 0);

    app.record(&unit, &sales, "CR", "5", "2026-04-02").await;
    let balance: Value = app
        .get(&format!("/balance?business_unit_id={}", unit))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&balance["balance"]), d("105"));
    assert_eq!(balance["ticket_count"], 1);
}

#[tokio::test]
async fn dates_at_the_calendar_start_are_rejected() {
    let app = TestApp::spawn().await;
    let first_day = "-262143-01-01";

    for path in [
        format!("/sales/daily?days=7&date={}", first_day),
        format!("/sales/series?granularity=weekly&date={}", first_day),
        format!("/dashboard?date={}", first_day),
        format!("/reports/movements?from={0}&to={0}", first_day),
    ] {
        let response = app.get(&path).await;
        assert_eq!(response.status().as_u16(), 400, "{}", path);
    }

    // The server keeps answering afterwards.
    assert_eq!(app.get("/health").await.status().as_u16(), 200);
}
