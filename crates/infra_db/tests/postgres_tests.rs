//! PostgreSQL adapter tests
//!
//! These start a PostgreSQL container and are ignored by default.
//! Run with `cargo test -p infra_db -- --ignored` when Docker is available.

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{AdapterHealth, HealthCheckable, Money};
use domain_billing::{
    BalanceReconciler, BillingStore, InvoiceNumberPort, LedgerPort, NewInvoice, NewPayment,
    PricePort, Unit,
};
use infra_db::PostgresBillingAdapter;
use test_utils::{
    assert_balances_consistent, assert_money_eq, create_isolated_test_database, date,
    CustomerFixtures, InvoiceDraftBuilder, PriceFixtures, ProductFixtures, TestDatabase,
};

async fn database() -> TestDatabase {
    create_isolated_test_database()
        .await
        .expect("Failed to create test database")
}

async fn invoice_for(
    adapter: &PostgresBillingAdapter,
    customer: core_kernel::CustomerId,
    day: chrono::NaiveDate,
    count: rust_decimal::Decimal,
) -> NewInvoice {
    let product = adapter.insert_product(ProductFixtures::bread()).await.unwrap();
    InvoiceDraftBuilder::new(customer, day)
        .line(&product, Unit::Piece, count, PriceFixtures::unit_price(dec!(10), dec!(0)))
        .build()
        .into_new_invoice()
        .unwrap()
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_health_check() {
    let db = database().await;
    let result = db.billing_adapter().health_check().await;
    assert_eq!(result.status, AdapterHealth::Healthy);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_invoice_numbers_follow_on_and_restart_each_year() {
    let db = database().await;
    let adapter = db.billing_adapter();
    let customer = adapter.insert_customer(CustomerFixtures::bakery()).await.unwrap();

    let first = invoice_for(&adapter, customer.id, date(2024, 11, 3), dec!(1)).await;
    let second = invoice_for(&adapter, customer.id, date(2024, 12, 30), dec!(2)).await;
    let third = invoice_for(&adapter, customer.id, date(2025, 1, 2), dec!(3)).await;

    let first = adapter.insert_invoice(first, 2024).await.unwrap();
    let second = adapter.insert_invoice(second, 2024).await.unwrap();
    let third = adapter.insert_invoice(third, 2025).await.unwrap();

    assert_eq!(first.ref_no.to_string(), "1/24");
    assert_eq!(second.ref_no.to_string(), "2/24");
    assert_eq!(third.ref_no.to_string(), "1/25");

    let latest = adapter.latest_invoice().await.unwrap().unwrap();
    assert_eq!(latest.ref_no, "1/25");

    let lines = adapter.line_items(third.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].count, dec!(3));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_inserts_get_distinct_numbers() {
    let db = database().await;
    let adapter = Arc::new(db.billing_adapter());
    let customer = adapter.insert_customer(CustomerFixtures::bakery()).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let invoice = invoice_for(&adapter, customer.id, date(2024, 3, 1), dec!(1)).await;
        let adapter = Arc::clone(&adapter);
        handles.push(tokio::spawn(async move { adapter.insert_invoice(invoice, 2024).await }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        numbers.push(handle.await.unwrap().unwrap().ref_no.sequence());
    }
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=8).collect::<Vec<u32>>());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_reconciliation_against_postgres() {
    let db = database().await;
    let adapter = Arc::new(db.billing_adapter());
    let customer = adapter.insert_customer(CustomerFixtures::bakery()).await.unwrap();

    let invoice = invoice_for(&adapter, customer.id, date(2024, 1, 10), dec!(10)).await;
    adapter.insert_invoice(invoice, 2024).await.unwrap();
    adapter
        .insert_payment(NewPayment::new(customer.id, date(2024, 1, 10), Money::new(dec!(40))))
        .await
        .unwrap();

    let reconciler = BalanceReconciler::new(Arc::clone(&adapter));
    let report = reconciler.reconcile(customer.id).await.unwrap();
    assert_money_eq(report.final_balance, dec!(60));
    assert_eq!(report.writes(), 3);

    let entries = adapter.transactions_for_customer(customer.id).await.unwrap();
    assert_balances_consistent(&entries);
    assert_money_eq(adapter.customer_balance(customer.id).await.unwrap(), dec!(60));

    let again = reconciler.reconcile(customer.id).await.unwrap();
    assert_eq!(again.writes(), 0);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_price_upsert_replaces_existing_entry() {
    let db = database().await;
    let adapter = db.billing_adapter();
    let customer = adapter.insert_customer(CustomerFixtures::cafe()).await.unwrap();
    let product = adapter.insert_product(ProductFixtures::rolls()).await.unwrap();

    let mut price = PriceFixtures::standard(customer.id, product.id);
    adapter.upsert_prices(&[price.clone()]).await.unwrap();

    price.piece = PriceFixtures::unit_price(dec!(110), dec!(5));
    adapter.upsert_prices(&[price.clone()]).await.unwrap();

    let list = adapter.price_list_for_customer(customer.id).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list.get(product.id), Some(&price));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_missing_customer_is_not_found() {
    let db = database().await;
    let err = db
        .billing_adapter()
        .get_customer(core_kernel::CustomerId::new(404))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
