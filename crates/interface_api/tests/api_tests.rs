//! HTTP API tests against the in-memory store

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::NaiveDate;
use serde_json::{json, Value};

use core_kernel::{Clock, FixedClock};
use domain_billing::ports::mock::InMemoryBillingStore;
use domain_billing::{BillingService, BillingStore};
use interface_api::config::ApiConfig;
use interface_api::{create_router, SharedBillingService};

fn server() -> TestServer {
    let store: Arc<dyn BillingStore> = Arc::new(InMemoryBillingStore::new());
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()));
    let service: SharedBillingService = Arc::new(BillingService::new(store, clock));
    TestServer::new(create_router(service, ApiConfig::default())).unwrap()
}

/// Creates a product and a customer whose list prices it at 100 less 5%
async fn seed(server: &TestServer) -> (i64, i64) {
    let product: Value = server
        .post("/api/v1/products")
        .json(&json!({ "name": "White Bread", "bulk_suffix": "crate", "display_order": 1 }))
        .await
        .json();
    let product_id = product["id"].as_i64().unwrap();

    let customer: Value = server
        .post("/api/v1/customers")
        .json(&json!({
            "name": "Corner Bakery",
            "payment_terms_days": 14,
            "prices": [{
                "product_id": product_id,
                "piece_price": "100",
                "piece_discount": "5",
                "bulk_price": "40"
            }]
        }))
        .await
        .json();

    (customer["id"].as_i64().unwrap(), product_id)
}

fn invoice_body(customer_id: i64, product_id: i64, price: Option<&str>) -> Value {
    let mut line = json!({ "product_id": product_id, "unit": "piece", "count": "2" });
    if let Some(price) = price {
        line["price"] = json!({ "price": price, "discount": "5" });
    }
    json!({ "customer_id": customer_id, "date": "2024-04-01", "lines": [line] })
}

#[tokio::test]
async fn test_health() {
    let server = server();
    server.get("/health").await.assert_status_ok();

    let ready: Value = server.get("/health/ready").await.json();
    assert_eq!(ready["status"], "ready");
}

#[tokio::test]
async fn test_create_and_list_customers() {
    let server = server();
    let (customer_id, product_id) = seed(&server).await;

    let customers: Value = server.get("/api/v1/customers").await.json();
    assert_eq!(customers.as_array().unwrap().len(), 1);
    assert_eq!(customers[0]["name"], "Corner Bakery");

    let prices: Value = server
        .get(&format!("/api/v1/customers/{customer_id}/prices"))
        .await
        .json();
    assert_eq!(prices[0]["product_id"], product_id);
}

#[tokio::test]
async fn test_invalid_customer_is_rejected() {
    let server = server();
    let response = server
        .post("/api/v1/customers")
        .json(&json!({ "name": "" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_invoice_uses_list_price_and_updates_balance() {
    let server = server();
    let (customer_id, product_id) = seed(&server).await;

    let response = server
        .post("/api/v1/invoices")
        .json(&invoice_body(customer_id, product_id, None))
        .await;
    response.assert_status(StatusCode::CREATED);

    let saved: Value = response.json();
    assert_eq!(saved["invoice"]["ref_no"], "1/24");
    assert_eq!(saved["invoice"]["due_date"], "2024-04-15");
    assert_eq!(saved["price_changes"].as_array().unwrap().len(), 0);

    let customer: Value = server
        .get(&format!("/api/v1/customers/{customer_id}"))
        .await
        .json();
    assert_eq!(customer["balance"], "190.00");

    let next: Value = server.get("/api/v1/invoices/next-number").await.json();
    assert_eq!(next["ref_no"], "2/24");
}

#[tokio::test]
async fn test_price_change_round_trip() {
    let server = server();
    let (customer_id, product_id) = seed(&server).await;

    let saved: Value = server
        .post("/api/v1/invoices")
        .json(&invoice_body(customer_id, product_id, Some("110")))
        .await
        .json();
    let changes = saved["price_changes"].clone();
    assert_eq!(changes.as_array().unwrap().len(), 1);

    server
        .post("/api/v1/invoices/price-changes")
        .json(&json!({ "changes": changes }))
        .await
        .assert_status_ok();

    let prices: Value = server
        .get(&format!("/api/v1/customers/{customer_id}/prices"))
        .await
        .json();
    assert_eq!(prices[0]["piece"]["price"], "110.00");
}

#[tokio::test]
async fn test_payment_and_recalculation() {
    let server = server();
    let (customer_id, product_id) = seed(&server).await;
    server
        .post("/api/v1/invoices")
        .json(&invoice_body(customer_id, product_id, None))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/v1/payments")
        .json(&json!({ "customer_id": customer_id, "date": "2024-04-01", "amount": "40" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let saved: Value = response.json();
    assert_eq!(saved["payment"]["balance"], "-40.00");

    let report: Value = server
        .post(&format!("/api/v1/customers/{customer_id}/recalculate"))
        .await
        .json();
    assert_eq!(report["entries_examined"], 2);
    assert_eq!(report["entries_updated"], 0);
    assert_eq!(report["final_balance"], "150.00");
}

#[tokio::test]
async fn test_unknown_invoice_is_not_found() {
    let server = server();
    let response = server.get("/api/v1/invoices/99").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invoice_without_lines_is_rejected() {
    let server = server();
    let (customer_id, _) = seed(&server).await;

    let response = server
        .post("/api/v1/invoices")
        .json(&json!({ "customer_id": customer_id, "lines": [] }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation_error");

    let invoices: Value = server.get("/api/v1/invoices").await.json();
    assert!(invoices.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_zero_payment_is_rejected() {
    let server = server();
    let (customer_id, _) = seed(&server).await;

    server
        .post("/api/v1/payments")
        .json(&json!({ "customer_id": customer_id, "amount": "0" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}
