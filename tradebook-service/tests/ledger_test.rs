//! Payment recording, statement, and net-due balance tests.

mod common;

use common::{dec, TestApp};
use serde_json::json;

async fn seed_bill(app: &TestApp, supplier_id: &str) {
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
}

#[tokio::test]
async fn payment_reduces_net_due_by_its_exact_amount() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Due Farm", "Chicken").await;
    let supplier_id = supplier["supplier_id"].as_str().unwrap().to_string();
    seed_bill(&app, &supplier_id).await;

    let due: serde_json::Value = app
        .get(&format!("/suppliers/{}/net-due", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&due["net_due"]), dec(&json!("1200.00")));
    assert_eq!(due["standing"], "NET DUE");

    let response = app
        .post_json(
            "/ledger/payments",
            &json!({
                "supplier_id": supplier_id,
                "txn_date": "2024-03-02",
                "amount": "100"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let payment: serde_json::Value = response.json().await.unwrap();
    assert_eq!(payment["txn_type"], "Payment");
    // Stored negative regardless of the sign supplied.
    assert_eq!(dec(&payment["amount"]), dec(&json!("-100.00")));

    let due: serde_json::Value = app
        .get(&format!("/suppliers/{}/net-due", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&due["net_due"]), dec(&json!("1100.00")));
}

#[tokio::test]
async fn overpayment_flips_standing_to_overpaid() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Overpaid Farm", "Chicken").await;
    let supplier_id = supplier["supplier_id"].as_str().unwrap().to_string();
    seed_bill(&app, &supplier_id).await;

    app.post_json(
        "/ledger/payments",
        &json!({
            "supplier_id": supplier_id,
            "txn_date": "2024-03-02",
            "amount": "1500"
        }),
    )
    .await;

    let due: serde_json::Value = app
        .get(&format!("/suppliers/{}/net-due", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&due["net_due"]), dec(&json!("-300.00")));
    assert_eq!(due["standing"], "OVERPAID");
}

#[tokio::test]
async fn settled_balance_after_exact_payment() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Settled Farm", "Chicken").await;
    let supplier_id = supplier["supplier_id"].as_str().unwrap().to_string();
    seed_bill(&app, &supplier_id).await;

    app.post_json(
        "/ledger/payments",
        &json!({
            "supplier_id": supplier_id,
            "txn_date": "2024-03-02",
            "amount": "1200"
        }),
    )
    .await;

    let due: serde_json::Value = app
        .get(&format!("/suppliers/{}/net-due", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(dec(&due["net_due"]), rust_decimal::Decimal::ZERO);
    assert_eq!(due["standing"], "SETTLED");
}

#[tokio::test]
async fn zero_payment_is_rejected() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Zero Pay Farm", "Other").await;
    let supplier_id = supplier["supplier_id"].as_str().unwrap();

    let response = app
        .post_json(
            "/ledger/payments",
            &json!({
                "supplier_id": supplier_id,
                "txn_date": "2024-03-02",
                "amount": "0"
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 422);
}

#[tokio::test]
async fn statement_merges_bills_and_payments_newest_first() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Statement Farm", "Chicken").await;
    let supplier_id = supplier["supplier_id"].as_str().unwrap().to_string();
    seed_bill(&app, &supplier_id).await;

    app.post_json(
        "/ledger/payments",
        &json!({
            "supplier_id": supplier_id,
            "txn_date": "2024-03-05",
            "amount": "500",
            "details": "Part payment"
        }),
    )
    .await;

    let statement: serde_json::Value = app
        .get(&format!("/suppliers/{}/ledger", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    let lines = statement["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);

    // Newest first: the payment precedes the bill.
    assert_eq!(lines[0]["txn_type"], "Payment");
    assert_eq!(lines[0]["txn_date"], "2024-03-05");
    assert_eq!(dec(&lines[0]["amount"]), dec(&json!("-500.00")));
    assert_eq!(lines[0]["details"], "Part payment");

    assert_eq!(lines[1]["txn_type"], "Bill");
    assert_eq!(lines[1]["txn_date"], "2024-03-01");
    assert_eq!(dec(&lines[1]["amount"]), dec(&json!("1200.00")));
}

#[tokio::test]
async fn overview_sums_outstanding_across_suppliers() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let first = app.create_supplier("Overview One", "Chicken").await;
    let first_id = first["supplier_id"].as_str().unwrap().to_string();
    let second = app.create_supplier("Overview Two", "Chicken").await;
    let second_id = second["supplier_id"].as_str().unwrap().to_string();

    seed_bill(&app, &first_id).await;
    app.post_json(
        "/bills",
        &json!({
            "supplier_id": second_id,
            "bill_date": "2024-03-01",
            "rows": [
                { "item_name": "Wings", "qty_received": "10", "qty_damaged": "0", "vendor_rate": "115" }
            ]
        }),
    )
    .await;
    app.post_json(
        "/ledger/payments",
        &json!({
            "supplier_id": first_id,
            "txn_date": "2024-03-02",
            "amount": "200"
        }),
    )
    .await;

    let overview: serde_json::Value = app.get("/reports/overview").await.json().await.unwrap();
    assert_eq!(overview["active_suppliers"], 2);
    // 1200 + 1150 - 200.
    assert_eq!(dec(&overview["total_outstanding"]), dec(&json!("2150.00")));
}

#[tokio::test]
async fn variance_report_lists_only_rows_with_variance() {
    let Some(app) = TestApp::try_spawn().await else {
        return;
    };

    let supplier = app.create_supplier("Variance Farm", "Chicken").await;
    let supplier_id = supplier["supplier_id"].as_str().unwrap().to_string();
    app.set_rates("2024-03-01", "100", "80", "50").await;

    app.post_json(
        "/bills",
        &json!({
            "supplier_id": supplier_id,
            "bill_date": "2024-03-01",
            "rows": [
                { "item_name": "Tandoori", "qty_received": "10", "qty_damaged": "0", "vendor_rate": "120" },
                { "item_name": "Wings", "qty_received": "10", "qty_damaged": "0", "vendor_rate": "130" }
            ]
        }),
    )
    .await;

    let report: serde_json::Value = app
        .get(&format!("/reports/variance?supplier_id={}", supplier_id))
        .await
        .json()
        .await
        .unwrap();
    let rows = report["rows"].as_array().unwrap();
    // Tandoori matches expectation exactly; only Wings (expected 115,
    // billed 130) shows up.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["item_name"], "Wings");
    assert_eq!(dec(&rows[0]["variance"]), dec(&json!("150.00")));
    assert_eq!(dec(&rows[0]["variance_pct"]), dec(&json!("13.04")));
    assert_eq!(rows[0]["status"], "HIGH (+)");
}
