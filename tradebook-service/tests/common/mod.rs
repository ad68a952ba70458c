//! Test helper module for tradebook-service integration tests.
//!
//! Provides common setup utilities for PostgreSQL-based tests. Tests spawn
//! the full application against an isolated schema; when TEST_DATABASE_URL
//! is not set the suite is skipped.

#![allow(dead_code)]

use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::atomic::{AtomicU32, Ordering};
use tradebook_service::config::{DatabaseConfig, TradebookConfig};
use tradebook_service::services::init_metrics;
use tradebook_service::startup::Application;

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_tradebook_{}_{}", std::process::id(), counter)
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a test application on a random port against an isolated schema.
    /// Returns None (skipping the test) when TEST_DATABASE_URL is not set.
    pub async fn try_spawn() -> Option<Self> {
        let Ok(base_url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set; skipping integration test");
            return None;
        };

        // Required for the metrics endpoint; idempotent across tests.
        init_metrics();

        let schema_name = unique_schema_name();

        // Create schema for test isolation
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&base_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await
            .ok();
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await
            .expect("Failed to create test schema");

        pool.close().await;

        // Use ? or & depending on whether URL already has query parameters
        let separator = if base_url.contains('?') { "&" } else { "?" };
        let db_url_with_schema = format!(
            "{}{}options=-c search_path%3D{}",
            base_url, separator, schema_name
        );

        let config = TradebookConfig {
            common: CoreConfig {
                port: 0, // Random port
                log_level: "warn".to_string(),
            },
            service_name: "tradebook-service-test".to_string(),
            service_version: "0.1.0".to_string(),
            database: DatabaseConfig {
                url: db_url_with_schema,
                max_connections: 5,
                min_connections: 1,
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");
        let port = app.port();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let address = format!("http://127.0.0.1:{}", port);

        // Wait for the server to be ready by polling the health endpoint
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if let Ok(response) = client.get(&health_url).send().await {
                if response.status().is_success() {
                    return Some(Self {
                        address,
                        port,
                        client,
                    });
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        panic!("Test application did not become healthy");
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("request failed")
    }

    /// Create a supplier and return its JSON representation.
    pub async fn create_supplier(&self, name: &str, vendor_type: &str) -> Value {
        let response = self
            .post_json(
                "/suppliers",
                &json!({ "name": name, "vendor_type": vendor_type }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "supplier create failed");
        response.json().await.expect("invalid supplier json")
    }

    /// Upsert the daily rates for a date.
    pub async fn set_rates(&self, date: &str, tandoor: &str, boiler: &str, egg: &str) {
        let response = self
            .put_json(
                &format!("/rates/{}", date),
                &json!({
                    "tandoor_rate": tandoor,
                    "boiler_rate": boiler,
                    "egg_rate": egg
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200, "rate upsert failed");
    }
}

/// Parse a Decimal out of a JSON field that may be a string or a number.
pub fn dec(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("invalid decimal string"),
        Value::Number(n) => n.to_string().parse().expect("invalid decimal number"),
        other => panic!("expected decimal, got {:?}", other),
    }
}
