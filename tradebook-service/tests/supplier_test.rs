//! Supplier CRUD and cascade-delete integration tests.

mod common;

use common::{dec, TestApp};
use rust_decimal::Decimal;
use serde_json::json;

#[tokio::test]
async fn create_supplier_returns_created() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Akbar Traders", "Chicken").await;
    assert_eq!(supplier["name"], "Akbar Traders");
    assert_eq!(supplier["vendor_type"], "Chicken");
    assert_eq!(supplier["markup_required"], true);
}

#[tokio::test]
async fn duplicate_supplier_name_conflicts() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    app.create_supplier("Akbar Traders", "Chicken").await;
    let response = app
        .post_json(
            "/suppliers",
            &json!({ "name": "Akbar Traders", "vendor_type": "Other" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn blank_supplier_name_is_rejected() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let response = app
        .post_json("/suppliers", &json!({ "name": "  ", "vendor_type": "Other" }))
        .await;
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn chicken_vendor_gets_default_markup_rules() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Murgi House", "Chicken").await;
    assert_eq!(supplier["default_rules_seeded"], 7);

    let supplier_id = supplier["supplier_id"].as_str().unwrap();
    let items: serde_json::Value = app
        .get(&format!("/suppliers/{}/items", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    let items = items["items"].as_array().unwrap();
    assert_eq!(items.len(), 7);
    assert!(items.iter().any(|i| i == "Tandoori"));
    assert!(items.iter().any(|i| i == "Wings"));
}

#[tokio::test]
async fn non_chicken_vendor_gets_no_default_rules() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Veggie Mart", "Vegetable").await;
    assert_eq!(supplier["default_rules_seeded"], 0);

    let supplier_id = supplier["supplier_id"].as_str().unwrap();
    let items: serde_json::Value = app
        .get(&format!("/suppliers/{}/items", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    assert!(items["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn rename_to_existing_supplier_conflicts() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    app.create_supplier("First Farm", "Other").await;
    let second = app.create_supplier("Second Farm", "Other").await;
    let second_id = second["supplier_id"].as_str().unwrap();

    let response = app
        .put_json(
            &format!("/suppliers/{}", second_id),
            &json!({ "name": "First Farm", "vendor_type": "Other" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn delete_supplier_cascades_to_all_records() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Cascade Farm", "Chicken").await;
    let supplier_id = supplier["supplier_id"].as_str().unwrap().to_string();

    app.set_rates("2024-03-01", "100", "80", "50").await;
    let response = app
        .post_json(
            "/bills",
            &json!({
                "supplier_id": supplier_id,
                "bill_date": "2024-03-01",
                "rows": [
                    { "item_name": "Tandoori", "qty_received": "10", "qty_damaged": "0", "vendor_rate": "120" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);

    let response = app.delete(&format!("/suppliers/{}", supplier_id)).await;
    assert_eq!(response.status().as_u16(), 204);

    let response = app.get(&format!("/suppliers/{}", supplier_id)).await;
    assert_eq!(response.status().as_u16(), 404);

    // Nothing of the supplier survives in the reports.
    let overview: serde_json::Value = app.get("/reports/overview").await.json().await.unwrap();
    assert_eq!(overview["active_suppliers"], 0);
    assert_eq!(dec(&overview["total_outstanding"]), Decimal::ZERO);
}

#[tokio::test]
async fn deleting_missing_supplier_is_not_found() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let response = app
        .delete("/suppliers/00000000-0000-0000-0000-000000000000")
        .await;
    assert_eq!(response.status().as_u16(), 404);
}
