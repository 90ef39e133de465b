use super::*;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;

use core_kernel::{AdapterHealth, HealthCheckResult};

use crate::numbering::next_invoice_number;

/// Number of single-field balance writes performed so far
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceWrites {
    pub invoices: usize,
    pub payments: usize,
    pub customers: usize,
}

impl BalanceWrites {
    pub fn total(&self) -> usize {
        self.invoices + self.payments + self.customers
    }
}

#[derive(Debug, Default)]
struct State {
    last_id: i64,
    customers: BTreeMap<CustomerId, Customer>,
    products: BTreeMap<ProductId, Product>,
    prices: HashMap<(CustomerId, ProductId), Price>,
    invoices: BTreeMap<InvoiceId, Invoice>,
    line_items: HashMap<InvoiceId, Vec<LineItem>>,
    payments: BTreeMap<PaymentId, Payment>,
    raw_ref_nos: HashMap<InvoiceId, String>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn latest_invoice(&self) -> Option<LatestInvoice> {
        self.invoices.values().next_back().map(|invoice| LatestInvoice {
            date: invoice.date,
            ref_no: self
                .raw_ref_nos
                .get(&invoice.id)
                .cloned()
                .unwrap_or_else(|| invoice.ref_no.to_string()),
        })
    }

    fn require_customer(&self, id: CustomerId) -> Result<&Customer, PortError> {
        self.customers
            .get(&id)
            .ok_or_else(|| PortError::not_found("Customer", id))
    }
}

/// In-memory implementation of every billing port
///
/// Counts balance writes so tests can observe what reconciliation wrote, and
/// can be told to fail balance writes to simulate I/O errors.
#[derive(Debug, Default)]
pub struct InMemoryBillingStore {
    state: RwLock<State>,
    invoice_writes: AtomicUsize,
    payment_writes: AtomicUsize,
    customer_writes: AtomicUsize,
    write_budget: Mutex<Option<usize>>,
}

impl InMemoryBillingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance writes performed since creation or the last reset
    pub fn balance_writes(&self) -> BalanceWrites {
        BalanceWrites {
            invoices: self.invoice_writes.load(Ordering::SeqCst),
            payments: self.payment_writes.load(Ordering::SeqCst),
            customers: self.customer_writes.load(Ordering::SeqCst),
        }
    }

    pub fn reset_write_counts(&self) {
        self.invoice_writes.store(0, Ordering::SeqCst);
        self.payment_writes.store(0, Ordering::SeqCst);
        self.customer_writes.store(0, Ordering::SeqCst);
    }

    /// Lets `count` more balance writes succeed, then fails the rest
    pub fn fail_balance_writes_after(&self, count: usize) {
        if let Ok(mut budget) = self.write_budget.lock() {
            *budget = Some(count);
        }
    }

    /// Removes a previously set write failure
    pub fn heal(&self) {
        if let Ok(mut budget) = self.write_budget.lock() {
            *budget = None;
        }
    }

    /// Stores an invoice as-is, keeping its id, number and balance
    pub async fn seed_invoice(&self, invoice: Invoice, line_items: Vec<LineItem>) {
        let mut state = self.state.write().await;
        state.last_id = state.last_id.max(invoice.id.get());
        state.line_items.insert(invoice.id, line_items);
        state.invoices.insert(invoice.id, invoice);
    }

    /// Stores a payment as-is, keeping its id and balance
    pub async fn seed_payment(&self, payment: Payment) {
        let mut state = self.state.write().await;
        state.last_id = state.last_id.max(payment.id.get());
        state.payments.insert(payment.id, payment);
    }

    /// Makes `latest_invoice` report a raw reference number for an invoice
    pub async fn override_ref_no(&self, id: InvoiceId, raw: impl Into<String>) {
        self.state.write().await.raw_ref_nos.insert(id, raw.into());
    }

    fn take_write(&self, counter: &AtomicUsize, what: &str) -> Result<(), PortError> {
        if let Ok(mut budget) = self.write_budget.lock() {
            if let Some(remaining) = budget.as_mut() {
                if *remaining == 0 {
                    return Err(PortError::connection(format!("simulated failure writing {what}")));
                }
                *remaining -= 1;
            }
        }
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl DomainPort for InMemoryBillingStore {}

#[async_trait]
impl HealthCheckable for InMemoryBillingStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-billing-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl LedgerPort for InMemoryBillingStore {
    async fn transactions_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<LedgerEntry>, PortError> {
        let state = self.state.read().await;
        let invoices = state
            .invoices
            .values()
            .filter(|i| i.customer_id == customer_id)
            .map(LedgerEntry::from);
        let payments = state
            .payments
            .values()
            .filter(|p| p.customer_id == customer_id)
            .map(LedgerEntry::from);
        Ok(invoices.chain(payments).collect())
    }

    async fn customer_balance(&self, customer_id: CustomerId) -> Result<Money, PortError> {
        let state = self.state.read().await;
        Ok(state.require_customer(customer_id)?.balance)
    }

    async fn update_invoice_balance(&self, id: InvoiceId, balance: Money) -> Result<(), PortError> {
        self.take_write(&self.invoice_writes, "invoice balance")?;
        let mut state = self.state.write().await;
        let invoice = state
            .invoices
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Invoice", id))?;
        invoice.balance = balance;
        Ok(())
    }

    async fn update_payment_balance(&self, id: PaymentId, balance: Money) -> Result<(), PortError> {
        self.take_write(&self.payment_writes, "payment balance")?;
        let mut state = self.state.write().await;
        let payment = state
            .payments
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Payment", id))?;
        payment.balance = balance;
        Ok(())
    }

    async fn update_customer_balance(&self, id: CustomerId, balance: Money) -> Result<(), PortError> {
        self.take_write(&self.customer_writes, "customer balance")?;
        let mut state = self.state.write().await;
        let customer = state
            .customers
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Customer", id))?;
        customer.balance = balance;
        Ok(())
    }
}

#[async_trait]
impl InvoiceNumberPort for InMemoryBillingStore {
    async fn latest_invoice(&self) -> Result<Option<LatestInvoice>, PortError> {
        Ok(self.state.read().await.latest_invoice())
    }
}

#[async_trait]
impl PricePort for InMemoryBillingStore {
    async fn price_list_for_customer(&self, customer_id: CustomerId) -> Result<PriceList, PortError> {
        let state = self.state.read().await;
        let prices = state
            .prices
            .values()
            .filter(|p| p.customer_id == customer_id)
            .cloned();
        Ok(PriceList::new(customer_id, prices))
    }

    async fn upsert_prices(&self, prices: &[Price]) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        for price in prices {
            state
                .prices
                .insert((price.customer_id, price.product_id), price.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl BillingStore for InMemoryBillingStore {
    async fn list_customers(&self) -> Result<Vec<Customer>, PortError> {
        Ok(self.state.read().await.customers.values().cloned().collect())
    }

    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError> {
        self.state.read().await.require_customer(id).cloned()
    }

    async fn insert_customer(&self, details: CustomerDetails) -> Result<Customer, PortError> {
        let mut state = self.state.write().await;
        let customer = Customer::new(CustomerId::new(state.next_id()), details);
        state.customers.insert(customer.id, customer.clone());
        Ok(customer)
    }

    async fn update_customer(
        &self,
        id: CustomerId,
        details: CustomerDetails,
    ) -> Result<Customer, PortError> {
        let mut state = self.state.write().await;
        let customer = state
            .customers
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Customer", id))?;
        customer.details = details;
        Ok(customer.clone())
    }

    async fn list_products(&self) -> Result<Vec<Product>, PortError> {
        let mut products: Vec<Product> = self.state.read().await.products.values().cloned().collect();
        products.sort_by_key(|p| (p.display_order(), p.id));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, PortError> {
        self.state
            .read()
            .await
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Product", id))
    }

    async fn insert_product(&self, details: ProductDetails) -> Result<Product, PortError> {
        let mut state = self.state.write().await;
        let product = Product::new(ProductId::new(state.next_id()), details);
        state.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: ProductId, details: ProductDetails) -> Result<Product, PortError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Product", id))?;
        product.details = details;
        Ok(product.clone())
    }

    async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError> {
        Ok(self.state.read().await.invoices.values().rev().cloned().collect())
    }

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError> {
        self.state
            .read()
            .await
            .invoices
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Invoice", id))
    }

    async fn line_items(&self, invoice_id: InvoiceId) -> Result<Vec<LineItem>, PortError> {
        let state = self.state.read().await;
        if !state.invoices.contains_key(&invoice_id) {
            return Err(PortError::not_found("Invoice", invoice_id));
        }
        let mut items = state.line_items.get(&invoice_id).cloned().unwrap_or_default();
        items.sort_by_key(|l| l.position);
        Ok(items)
    }

    async fn insert_invoice(&self, invoice: NewInvoice, year: i32) -> Result<Invoice, PortError> {
        let mut state = self.state.write().await;
        state.require_customer(invoice.customer_id)?;

        let ref_no = next_invoice_number(state.latest_invoice().as_ref(), year)
            .map_err(|e| PortError::transformation(e.to_string()))?;

        let stored = Invoice {
            id: InvoiceId::new(state.next_id()),
            ref_no,
            customer_id: invoice.customer_id,
            date: invoice.date,
            due_date: invoice.due_date,
            totals: invoice.totals,
            balance: Money::zero(),
        };
        state.line_items.insert(stored.id, invoice.line_items);
        state.invoices.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_invoice(&self, id: InvoiceId, invoice: NewInvoice) -> Result<Invoice, PortError> {
        let mut state = self.state.write().await;
        state.require_customer(invoice.customer_id)?;

        let stored = state
            .invoices
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Invoice", id))?;
        stored.customer_id = invoice.customer_id;
        stored.date = invoice.date;
        stored.due_date = invoice.due_date;
        stored.totals = invoice.totals;
        let updated = stored.clone();

        state.line_items.insert(id, invoice.line_items);
        Ok(updated)
    }

    async fn list_payments(&self) -> Result<Vec<Payment>, PortError> {
        Ok(self.state.read().await.payments.values().rev().cloned().collect())
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError> {
        self.state
            .read()
            .await
            .payments
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Payment", id))
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PortError> {
        let mut state = self.state.write().await;
        state.require_customer(payment.customer_id)?;

        let stored = Payment {
            id: PaymentId::new(state.next_id()),
            customer_id: payment.customer_id,
            invoice_id: payment.invoice_id,
            date: payment.date,
            amount: payment.amount,
            balance: Money::zero(),
        };
        state.payments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_payment(&self, id: PaymentId, payment: NewPayment) -> Result<Payment, PortError> {
        let mut state = self.state.write().await;
        state.require_customer(payment.customer_id)?;

        let stored = state
            .payments
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Payment", id))?;
        stored.customer_id = payment.customer_id;
        stored.invoice_id = payment.invoice_id;
        stored.date = payment.date;
        stored.amount = payment.amount;
        Ok(stored.clone())
    }
}
