#![allow(dead_code)]

use cashbox_service::config::CashboxConfig;
use cashbox_service::services::{InMemoryStore, SharedStore};
use cashbox_service::startup::Application;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_USER_ID: &str = "test-user";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub store: SharedStore,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let store: SharedStore = Arc::new(InMemoryStore::new());
        let app = Application::build_with_store(CashboxConfig::in_memory(0), store.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to answer on /health
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Self {
            address,
            port,
            client,
            store,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("X-User-ID", TEST_USER_ID)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .header("X-User-ID", TEST_USER_ID)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .header("X-User-ID", TEST_USER_ID)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .header("X-User-ID", TEST_USER_ID)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn create_unit(&self, name: &str) -> String {
        let response = self
            .post(
                "/business-units",
                &json!({ "name": name, "color": "#1E88E5" }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        id_of(&response.json::<Value>().await.unwrap())
    }

    pub async fn create_category(&self, name: &str, movement_type: &str) -> String {
        let response = self
            .post(
                "/categories",
                &json!({ "name": name, "movement_type": movement_type }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201);
        id_of(&response.json::<Value>().await.unwrap())
    }

    /// Record a movement and return the created row.
    pub async fn record(
        &self,
        unit: &str,
        category: &str,
        movement_type: &str,
        amount: &str,
        date: &str,
    ) -> Value {
        let response = self
            .post(
                "/movements",
                &json!({
                    "business_unit_id": unit,
                    "movement_type": movement_type,
                    "category_id": category,
                    "amount": amount,
                    "transaction_date": date,
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "movement not recorded");
        response.json().await.unwrap()
    }
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("missing id").to_string()
}

/// Read a decimal that may be serialized as a string or a number.
pub fn dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("invalid decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("invalid decimal number"),
        other => panic!("not a decimal: {}", other),
    }
}

pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}
