//! PostgreSQL Billing Adapter
//!
//! Implements every billing port on top of the repositories in this crate.
//! The adapter owns the translation between row types and domain types:
//! stored values that do not form valid domain values (a discount above
//! 100%, a malformed reference number, an unknown ledger kind) surface as
//! `PortError::Transformation`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillingAdapter;
//! use domain_billing::{BillingService, BillingStore};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn BillingStore> = Arc::new(PostgresBillingAdapter::new(pool));
//! let service = BillingService::new(store, clock);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, CustomerId, DomainPort, HealthCheckResult, HealthCheckable, InvoiceId, Money,
    PaymentId, Percentage, PortError, ProductId,
};
use domain_billing::{
    next_invoice_number, BillingStore, Customer, CustomerDetails, DeliveryAddress, EntryKind,
    Invoice, InvoiceNumber, InvoiceNumberPort, InvoiceTotals, LatestInvoice, LedgerEntry,
    LedgerPort, LineItem, NewInvoice, NewPayment, Payment, Price, PriceList, PricePort, Product,
    ProductDetails, Unit, UnitPrice,
};

use crate::error::DatabaseError;
use crate::repositories::customers::{CustomerRow, NewCustomer as CustomerColumns};
use crate::repositories::invoices::{
    InvoiceRow, LineItemRow, NewInvoice as InvoiceColumns, NewLineItem as LineItemColumns,
    SaleUnit,
};
use crate::repositories::ledger::LedgerRow;
use crate::repositories::payments::{NewPayment as PaymentColumns, PaymentRow};
use crate::repositories::prices::PriceRow;
use crate::repositories::products::{NewProduct as ProductColumns, ProductRow};
use crate::repositories::{
    CustomerRepository, InvoiceRepository, LedgerRepository, PaymentRepository, PriceRepository,
    ProductRepository,
};

const ADAPTER_ID: &str = "postgres-billing-adapter";

/// PostgreSQL-backed implementation of the billing ports
#[derive(Debug, Clone)]
pub struct PostgresBillingAdapter {
    customers: CustomerRepository,
    products: ProductRepository,
    prices: PriceRepository,
    invoices: InvoiceRepository,
    payments: PaymentRepository,
    ledger: LedgerRepository,
    pool: PgPool,
}

impl PostgresBillingAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            customers: CustomerRepository::new(pool.clone()),
            products: ProductRepository::new(pool.clone()),
            prices: PriceRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            ledger: LedgerRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresBillingAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillingAdapter {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl LedgerPort for PostgresBillingAdapter {
    #[instrument(skip_all, fields(customer_id = %customer_id))]
    async fn transactions_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        let rows = self
            .ledger
            .transactions_for_customer(customer_id.get())
            .await
            .map_err(db_to_port_error)?;
        debug!(count = rows.len(), "Loaded customer transactions");
        rows.into_iter().map(ledger_row_to_entry).collect()
    }

    async fn customer_balance(&self, customer_id: CustomerId) -> Result<Money, PortError> {
        let balance = self
            .customers
            .balance(customer_id.get())
            .await
            .map_err(db_to_port_error)?;
        Ok(Money::new(balance))
    }

    #[instrument(skip_all, fields(invoice_id = %id, balance = %balance))]
    async fn update_invoice_balance(&self, id: InvoiceId, balance: Money) -> Result<(), PortError> {
        self.invoices
            .update_balance(id.get(), balance.amount())
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip_all, fields(payment_id = %id, balance = %balance))]
    async fn update_payment_balance(&self, id: PaymentId, balance: Money) -> Result<(), PortError> {
        self.payments
            .update_balance(id.get(), balance.amount())
            .await
            .map_err(db_to_port_error)
    }

    #[instrument(skip_all, fields(customer_id = %id, balance = %balance))]
    async fn update_customer_balance(&self, id: CustomerId, balance: Money) -> Result<(), PortError> {
        self.customers
            .update_balance(id.get(), balance.amount())
            .await
            .map_err(db_to_port_error)
    }
}

#[async_trait]
impl InvoiceNumberPort for PostgresBillingAdapter {
    async fn latest_invoice(&self) -> Result<Option<LatestInvoice>, PortError> {
        let row = self.invoices.latest().await.map_err(db_to_port_error)?;
        Ok(row.map(|r| LatestInvoice {
            date: r.date,
            ref_no: r.ref_no,
        }))
    }
}

#[async_trait]
impl PricePort for PostgresBillingAdapter {
    #[instrument(skip_all, fields(customer_id = %customer_id))]
    async fn price_list_for_customer(&self, customer_id: CustomerId) -> Result<PriceList, PortError> {
        let rows = self
            .prices
            .for_customer(customer_id.get())
            .await
            .map_err(db_to_port_error)?;
        let prices = rows
            .into_iter()
            .map(price_row_to_domain)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PriceList::new(customer_id, prices))
    }

    #[instrument(skip(self, prices), fields(count = prices.len()))]
    async fn upsert_prices(&self, prices: &[Price]) -> Result<(), PortError> {
        let rows: Vec<PriceRow> = prices.iter().map(price_to_row).collect();
        self.prices.upsert(&rows).await.map_err(db_to_port_error)
    }
}

#[async_trait]
impl BillingStore for PostgresBillingAdapter {
    async fn list_customers(&self) -> Result<Vec<Customer>, PortError> {
        let rows = self.customers.list().await.map_err(db_to_port_error)?;
        rows.into_iter().map(customer_row_to_domain).collect()
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        let row = self.customers.get_by_id(id.get()).await.map_err(db_to_port_error)?;
        customer_row_to_domain(row)
    }

    #[instrument(skip(self, details))]
    async fn insert_customer(&self, details: CustomerDetails) -> Result<Customer, PortError> {
        let row = self
            .customers
            .insert(customer_columns(details)?)
            .await
            .map_err(db_to_port_error)?;
        customer_row_to_domain(row)
    }

    #[instrument(skip(self, details), fields(customer_id = %id))]
    async fn update_customer(
        &self,
        id: CustomerId,
        details: CustomerDetails,
    ) -> Result<Customer, PortError> {
        let row = self
            .customers
            .update(id.get(), customer_columns(details)?)
            .await
            .map_err(db_to_port_error)?;
        customer_row_to_domain(row)
    }

    async fn list_products(&self) -> Result<Vec<Product>, PortError> {
        let rows = self.products.list().await.map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(product_row_to_domain).collect())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
        let row = self.products.get_by_id(id.get()).await.map_err(db_to_port_error)?;
        Ok(product_row_to_domain(row))
    }

    #[instrument(skip(self, details))]
    async fn insert_product(&self, details: ProductDetails) -> Result<Product, PortError> {
        let row = self
            .products
            .insert(product_columns(details))
            .await
            .map_err(db_to_port_error)?;
        Ok(product_row_to_domain(row))
    }

    #[instrument(skip(self, details), fields(product_id = %id))]
    async fn update_product(&self, id: ProductId, details: ProductDetails) -> Result<Product, PortError> {
        let row = self
            .products
            .update(id.get(), product_columns(details))
            .await
            .map_err(db_to_port_error)?;
        Ok(product_row_to_domain(row))
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError> {
        let rows = self.invoices.list().await.map_err(db_to_port_error)?;
        rows.into_iter().map(invoice_row_to_domain).collect()
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        let row = self.invoices.get_by_id(id.get()).await.map_err(db_to_port_error)?;
        invoice_row_to_domain(row)
    }

    async fn line_items(&self, invoice_id: InvoiceId) -> Result<Vec<LineItem>, PortError> {
        let rows = self
            .invoices
            .line_items(invoice_id.get())
            .await
            .map_err(db_to_port_error)?;
        rows.into_iter().map(line_item_row_to_domain).collect()
    }

    #[instrument(skip(self, invoice), fields(customer_id = %invoice.customer_id))]
    async fn insert_invoice(&self, invoice: NewInvoice, year: i32) -> Result<Invoice, PortError> {
        let (header, lines) = invoice_columns(&invoice)?;

        let row = self
            .invoices
            .insert_numbered(header, lines, move |latest| {
                let latest = latest.map(|r| LatestInvoice {
                    date: r.date,
                    ref_no: r.ref_no,
                });
                next_invoice_number(latest.as_ref(), year)
                    .map(|number| number.to_string())
                    .map_err(|e| DatabaseError::InvalidData(e.to_string()))
            })
            .await
            .map_err(db_to_port_error)?;

        invoice_row_to_domain(row)
    }

    #[instrument(skip(self, invoice), fields(invoice_id = %id))]
    async fn update_invoice(&self, id: InvoiceId, invoice: NewInvoice) -> Result<Invoice, PortError> {
        let (header, lines) = invoice_columns(&invoice)?;
        let row = self
            .invoices
            .update(id.get(), header, lines)
            .await
            .map_err(db_to_port_error)?;
        invoice_row_to_domain(row)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, PortError> {
        let rows = self.payments.list().await.map_err(db_to_port_error)?;
        Ok(rows.into_iter().map(payment_row_to_domain).collect())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        let row = self.payments.get_by_id(id.get()).await.map_err(db_to_port_error)?;
        Ok(payment_row_to_domain(row))
    }

    #[instrument(skip(self, payment), fields(customer_id = %payment.customer_id))]
    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PortError> {
        let row = self
            .payments
            .insert(payment_columns(payment))
            .await
            .map_err(db_to_port_error)?;
        Ok(payment_row_to_domain(row))
    }

    #[instrument(skip(self, payment), fields(payment_id = %id))]
    async fn update_payment(&self, id: PaymentId, payment: NewPayment) -> Result<Payment, PortError> {
        let row = self
            .payments
            .update(id.get(), payment_columns(payment))
            .await
            .map_err(db_to_port_error)?;
        Ok(payment_row_to_domain(row))
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Converts a database error to a port error
fn db_to_port_error(e: DatabaseError) -> PortError {
    match e {
        DatabaseError::NotFound { entity, id } => PortError::not_found(entity, id),
        DatabaseError::DuplicateEntry(message) => PortError::Conflict { message },
        DatabaseError::ForeignKeyViolation(message) | DatabaseError::ConstraintViolation(message) => {
            PortError::validation(message)
        }
        DatabaseError::ConnectionFailed(message) => PortError::connection(message),
        DatabaseError::PoolExhausted => PortError::connection("connection pool exhausted"),
        DatabaseError::InvalidData(message) => PortError::transformation(message),
        other => PortError::Internal {
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}

fn percentage(value: rust_decimal::Decimal, column: &str) -> Result<Percentage, PortError> {
    Percentage::new(value).map_err(|e| PortError::transformation(format!("{column}: {e}")))
}

fn customer_row_to_domain(row: CustomerRow) -> Result<Customer, PortError> {
    let payment_terms_days = u32::try_from(row.payment_terms_days).map_err(|_| {
        PortError::transformation(format!(
            "customer {} has negative payment terms {}",
            row.id, row.payment_terms_days
        ))
    })?;

    Ok(Customer {
        id: CustomerId::new(row.id),
        details: CustomerDetails {
            name: row.name,
            address: row.address,
            tax_id: row.tax_id,
            registration_no: row.registration_no,
            bank_account: row.bank_account,
            payment_terms_days,
            delivery: DeliveryAddress {
                name: row.delivery_name,
                street: row.delivery_street,
                city: row.delivery_city,
            },
            active: row.active,
        },
        balance: Money::new(row.balance),
    })
}

fn customer_columns(details: CustomerDetails) -> Result<CustomerColumns, PortError> {
    let payment_terms_days = i32::try_from(details.payment_terms_days).map_err(|_| {
        PortError::validation_field("payment terms out of range", "payment_terms_days")
    })?;

    Ok(CustomerColumns {
        name: details.name,
        address: details.address,
        tax_id: details.tax_id,
        registration_no: details.registration_no,
        bank_account: details.bank_account,
        payment_terms_days,
        delivery_name: details.delivery.name,
        delivery_street: details.delivery.street,
        delivery_city: details.delivery.city,
        active: details.active,
    })
}

fn product_row_to_domain(row: ProductRow) -> Product {
    Product::new(
        ProductId::new(row.id),
        ProductDetails {
            name: row.name,
            short_name: row.short_name,
            piece_suffix: row.piece_suffix,
            bulk_suffix: row.bulk_suffix,
            piece_barcode: row.piece_barcode,
            bulk_barcode: row.bulk_barcode,
            active: row.active,
            display_order: row.display_order,
        },
    )
}

fn product_columns(details: ProductDetails) -> ProductColumns {
    ProductColumns {
        name: details.name,
        short_name: details.short_name,
        piece_suffix: details.piece_suffix,
        bulk_suffix: details.bulk_suffix,
        piece_barcode: details.piece_barcode,
        bulk_barcode: details.bulk_barcode,
        active: details.active,
        display_order: details.display_order,
    }
}

fn price_row_to_domain(row: PriceRow) -> Result<Price, PortError> {
    Ok(Price {
        customer_id: CustomerId::new(row.customer_id),
        product_id: ProductId::new(row.product_id),
        piece: UnitPrice::new(
            Money::new(row.piece_price),
            percentage(row.piece_discount, "piece_discount")?,
        ),
        bulk: UnitPrice::new(
            Money::new(row.bulk_price),
            percentage(row.bulk_discount, "bulk_discount")?,
        ),
    })
}

fn price_to_row(price: &Price) -> PriceRow {
    PriceRow {
        customer_id: price.customer_id.get(),
        product_id: price.product_id.get(),
        piece_price: price.piece.price.amount(),
        piece_discount: price.piece.discount.value(),
        bulk_price: price.bulk.price.amount(),
        bulk_discount: price.bulk.discount.value(),
    }
}

fn invoice_row_to_domain(row: InvoiceRow) -> Result<Invoice, PortError> {
    let ref_no: InvoiceNumber = row
        .ref_no
        .parse()
        .map_err(|e: domain_billing::BillingError| PortError::transformation(e.to_string()))?;

    Ok(Invoice {
        id: InvoiceId::new(row.id),
        ref_no,
        customer_id: CustomerId::new(row.customer_id),
        date: row.date,
        due_date: row.due_date,
        totals: InvoiceTotals {
            amount_before_discount: Money::new(row.amount_before_discount),
            discount: Money::new(row.discount),
            amount: Money::new(row.amount),
        },
        balance: Money::new(row.balance),
    })
}

fn invoice_columns(invoice: &NewInvoice) -> Result<(InvoiceColumns, Vec<LineItemColumns>), PortError> {
    let header = InvoiceColumns {
        customer_id: invoice.customer_id.get(),
        date: invoice.date,
        due_date: invoice.due_date,
        amount_before_discount: invoice.totals.amount_before_discount.amount(),
        discount: invoice.totals.discount.amount(),
        amount: invoice.totals.amount.amount(),
    };
    let lines = invoice
        .line_items
        .iter()
        .map(line_item_columns)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((header, lines))
}

fn line_item_columns(item: &LineItem) -> Result<LineItemColumns, PortError> {
    let position = i32::try_from(item.position)
        .map_err(|_| PortError::validation_field("line position out of range", "position"))?;

    Ok(LineItemColumns {
        position,
        product_id: item.product_id.get(),
        name: item.name.clone(),
        barcode: item.barcode.clone(),
        unit: unit_to_db(item.unit),
        count: item.count,
        price: item.price.amount(),
        discount: item.discount.value(),
        amount_before_discount: item.amount_before_discount.amount(),
        amount: item.amount.amount(),
    })
}

fn line_item_row_to_domain(row: LineItemRow) -> Result<LineItem, PortError> {
    let position = u32::try_from(row.position).map_err(|_| {
        PortError::transformation(format!("invalid line position {}", row.position))
    })?;

    Ok(LineItem {
        position,
        product_id: ProductId::new(row.product_id),
        name: row.name,
        barcode: row.barcode,
        unit: unit_from_db(row.unit),
        count: row.count,
        price: Money::new(row.price),
        discount: percentage(row.discount, "line_items.discount")?,
        amount_before_discount: Money::new(row.amount_before_discount),
        amount: Money::new(row.amount),
    })
}

fn payment_row_to_domain(row: PaymentRow) -> Payment {
    Payment {
        id: PaymentId::new(row.id),
        customer_id: CustomerId::new(row.customer_id),
        invoice_id: row.invoice_id.map(InvoiceId::new),
        date: row.date,
        amount: Money::new(row.amount),
        balance: Money::new(row.balance),
    }
}

fn payment_columns(payment: NewPayment) -> PaymentColumns {
    PaymentColumns {
        customer_id: payment.customer_id.get(),
        invoice_id: payment.invoice_id.map(|id| id.get()),
        date: payment.date,
        amount: payment.amount.amount(),
    }
}

fn ledger_row_to_entry(row: LedgerRow) -> Result<LedgerEntry, PortError> {
    let kind = match row.kind.as_str() {
        "invoice" => EntryKind::Invoice,
        "payment" => EntryKind::Payment,
        other => {
            return Err(PortError::transformation(format!("unknown ledger kind '{other}'")));
        }
    };
    let amount = Money::new(row.amount);
    let balance = Money::new(row.balance);

    Ok(match kind {
        EntryKind::Invoice => LedgerEntry::invoice(InvoiceId::new(row.id), row.date, amount, balance),
        EntryKind::Payment => LedgerEntry::payment(PaymentId::new(row.id), row.date, amount, balance),
    })
}

fn unit_to_db(unit: Unit) -> SaleUnit {
    match unit {
        Unit::Piece => SaleUnit::Piece,
        Unit::Bulk => SaleUnit::Bulk,
    }
}

fn unit_from_db(unit: SaleUnit) -> Unit {
    match unit {
        SaleUnit::Piece => Unit::Piece,
        SaleUnit::Bulk => Unit::Bulk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn invoice_row(ref_no: &str) -> InvoiceRow {
        InvoiceRow {
            id: 5,
            ref_no: ref_no.to_string(),
            customer_id: 2,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            amount_before_discount: dec!(100),
            discount: dec!(5),
            amount: dec!(95),
            balance: dec!(95),
        }
    }

    #[test]
    fn test_unit_conversion_roundtrip() {
        for unit in Unit::ALL {
            assert_eq!(unit_from_db(unit_to_db(unit)), unit);
        }
    }

    #[test]
    fn test_malformed_stored_ref_no_is_transformation_error() {
        let err = invoice_row_to_domain(invoice_row("INV-5")).unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[test]
    fn test_invoice_row_maps_totals() {
        let invoice = invoice_row_to_domain(invoice_row("5/24")).unwrap();
        assert_eq!(invoice.ref_no.to_string(), "5/24");
        assert_eq!(invoice.amount(), Money::new(dec!(95)));
        assert_eq!(invoice.payment_terms_days(), 30);
    }

    #[test]
    fn test_discount_above_hundred_is_rejected() {
        let row = PriceRow {
            customer_id: 1,
            product_id: 1,
            piece_price: dec!(10),
            piece_discount: dec!(120),
            bulk_price: dec!(0),
            bulk_discount: dec!(0),
        };
        assert!(matches!(price_row_to_domain(row), Err(PortError::Transformation { .. })));
    }

    #[test]
    fn test_unknown_ledger_kind() {
        let row = LedgerRow {
            kind: "credit_note".to_string(),
            id: 1,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount: dec!(1),
            balance: dec!(1),
        };
        assert!(ledger_row_to_entry(row).is_err());
    }

    #[test]
    fn test_not_found_maps_through() {
        let err = db_to_port_error(DatabaseError::not_found("Invoice", 9));
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Invoice"));
    }
}
