mod common;

use common::{d, dec, id_of, TestApp};
use serde_json::{json, Value};

async fn create_partner(app: &TestApp, name: &str, equity: &str) -> reqwest::Response {
    app.post(
        "/partners",
        &json!({ "name": name, "equity_percentage": equity }),
    )
    .await
}

async fn record_linked(
    app: &TestApp,
    unit: &str,
    category: &str,
    account: &str,
    movement_type: &str,
    amount: &str,
) -> reqwest::Response {
    app.post(
        "/movements",
        &json!({
            "business_unit_id": unit,
            "movement_type": movement_type,
            "category_id": category,
            "amount": amount,
            "partner_account_id": account,
        }),
    )
    .await
}

#[tokio::test]
async fn equity_cannot_exceed_one_hundred_percent() {
    let app = TestApp::spawn().await;

    assert_eq!(create_partner(&app, "Ana", "60").await.status().as_u16(), 201);
    assert_eq!(create_partner(&app, "Bruno", "40").await.status().as_u16(), 201);
    assert_eq!(create_partner(&app, "Carla", "0.01").await.status().as_u16(), 400);
}

#[tokio::test]
async fn equity_update_is_checked_against_others() {
    let app = TestApp::spawn().await;
    create_partner(&app, "Ana", "70").await;
    let bruno = id_of(&create_partner(&app, "Bruno", "30").await.json().await.unwrap());

    let response = app
        .patch(
            &format!("/partners/{}", bruno),
            &json!({ "equity_percentage": "31" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .patch(
            &format!("/partners/{}", bruno),
            &json!({ "equity_percentage": "25", "email": "bruno@example.com" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(dec(&updated["equity_percentage"]), d("25"));
    assert_eq!(updated["email"], "bruno@example.com");
}

#[tokio::test]
async fn exactly_one_managing_partner() {
    let app = TestApp::spawn().await;
    let ana = id_of(&create_partner(&app, "Ana", "50").await.json().await.unwrap());
    let bruno = id_of(&create_partner(&app, "Bruno", "50").await.json().await.unwrap());

    for id in [&ana, &bruno, &ana] {
        let response = app.post(&format!("/partners/{}/managing", id), &json!({})).await;
        assert_eq!(response.status().as_u16(), 200);

        let partners: Value = app.get("/partners").await.json().await.unwrap();
        let managing: Vec<&Value> = partners
            .as_array()
            .unwrap()
            .iter()
            .filter(|p| p["is_managing_partner"] == true)
            .collect();
        assert_eq!(managing.len(), 1);
        assert_eq!(managing[0]["id"], id.as_str());
    }
}

#[tokio::test]
async fn managing_partner_cannot_be_deactivated() {
    let app = TestApp::spawn().await;
    let ana = id_of(&create_partner(&app, "Ana", "50").await.json().await.unwrap());
    let bruno = id_of(&create_partner(&app, "Bruno", "50").await.json().await.unwrap());
    app.post(&format!("/partners/{}/managing", ana), &json!({})).await;

    let response = app.delete(&format!("/partners/{}", ana)).await;
    assert_eq!(response.status().as_u16(), 409);

    let response = app.delete(&format!("/partners/{}", bruno)).await;
    assert_eq!(response.status().as_u16(), 200);

    // Inactive partners cannot be promoted.
    let response = app
        .post(&format!("/partners/{}/managing", bruno), &json!({}))
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Their equity no longer counts.
    assert_eq!(create_partner(&app, "Carla", "50").await.status().as_u16(), 201);
}

#[tokio::test]
async fn unknown_partner_is_404() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            &format!("/partners/{}/managing", uuid::Uuid::new_v4()),
            &json!({}),
        )
        .await;

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn linked_movements_move_partner_account_balance() {
    let app = TestApp::spawn().await;
    let partner = id_of(&create_partner(&app, "Ana", "100").await.json().await.unwrap());
    let account = id_of(
        &app.post(
            &format!("/partners/{}/accounts", partner),
            &json!({ "name": "Current account" }),
        )
        .await
        .json::<Value>()
        .await
        .unwrap(),
    );
    let unit = app.create_unit("Kiosk").await;
    let contribution = app.create_category("Partner contribution", "CR").await;
    let withdrawal = app.create_category("Partner withdrawal", "DB").await;

    assert_eq!(
        record_linked(&app, &unit, &contribution, &account, "CR", "500")
            .await
            .status()
            .as_u16(),
        201
    );
    let last: Value = record_linked(&app, &unit, &withdrawal, &account, "DB", "120")
        .await
        .json()
        .await
        .unwrap();

    let accounts: Value = app
        .get(&format!("/partners/{}/accounts", partner))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&accounts[0]["balance"]), d("380"));

    // Deleting the withdrawal gives the money back.
    let response = app.delete(&format!("/movements/{}", id_of(&last))).await;
    assert_eq!(response.status().as_u16(), 200);

    let accounts: Value = app
        .get(&format!("/partners/{}/accounts", partner))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&accounts[0]["balance"]), d("500"));
}
