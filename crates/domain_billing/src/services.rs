//! Billing orchestration
//!
//! `BillingService` is what the surrounding application talks to. It runs
//! each write against the store, triggers reconciliation for every customer
//! whose history changed, runs price change detection after invoice saves
//! and keeps a read cache of the full customer, product, invoice and payment
//! lists.
//!
//! The cache is only for listing and lookups by id. Reconciliation and
//! detection always read from the store. After every write the service
//! refreshes the cache; callers that write to the store directly must call
//! [`BillingService::refresh`] themselves.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use core_kernel::{Clock, CustomerId, InvoiceId, PaymentId, PortError, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::customer::{Customer, CustomerDetails};
use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceDraft, InvoiceWithLines, LineItem};
use crate::numbering::{InvoiceNumber, InvoiceNumbering};
use crate::payment::{NewPayment, Payment};
use crate::ports::BillingStore;
use crate::price::{Price, PriceList, UnitPrice};
use crate::price_change::{detect_price_changes, merge_price_changes, PriceChange};
use crate::product::{Product, ProductDetails, Unit};
use crate::reconciliation::{BalanceReconciler, ReconciliationReport};

/// Result of creating or editing an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedInvoice {
    pub invoice: Invoice,
    pub line_items: Vec<LineItem>,
    /// One report per customer whose balances were recomputed
    pub reconciliations: Vec<ReconciliationReport>,
    /// Lines sold at other than the customer's list price
    pub price_changes: Vec<PriceChange>,
}

/// Result of recording or editing a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPayment {
    pub payment: Payment,
    pub reconciliations: Vec<ReconciliationReport>,
}

#[derive(Debug, Default)]
struct BillingCache {
    customers: HashMap<CustomerId, Customer>,
    products: HashMap<ProductId, Product>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
}

/// Entry point for every billing operation
pub struct BillingService<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    reconciler: BalanceReconciler<S>,
    numbering: InvoiceNumbering<S>,
    cache: RwLock<BillingCache>,
}

impl<S: BillingStore + ?Sized> BillingService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            reconciler: BalanceReconciler::new(Arc::clone(&store)),
            numbering: InvoiceNumbering::new(Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
            cache: RwLock::new(BillingCache::default()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Today's date in the business timezone
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    // ------------------------------------------------------------------
    // Cache
    // ------------------------------------------------------------------

    /// Reloads every cached list from the store
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), BillingError> {
        let customers = self.store.list_customers().await?;
        let products = self.store.list_products().await?;
        let invoices = self.store.list_invoices().await?;
        let payments = self.store.list_payments().await?;

        let mut cache = self.cache.write().await;
        cache.customers = customers.into_iter().map(|c| (c.id, c)).collect();
        cache.products = products.into_iter().map(|p| (p.id, p)).collect();
        cache.invoices = invoices;
        cache.payments = payments;

        info!(
            customers = cache.customers.len(),
            products = cache.products.len(),
            invoices = cache.invoices.len(),
            payments = cache.payments.len(),
            "Refreshed billing cache"
        );
        Ok(())
    }

    /// Cached customers by id
    pub async fn customers(&self) -> Vec<Customer> {
        let cache = self.cache.read().await;
        let mut customers: Vec<Customer> = cache.customers.values().cloned().collect();
        customers.sort_by_key(|c| c.id);
        customers
    }

    pub async fn customer(&self, id: CustomerId) -> Option<Customer> {
        self.cache.read().await.customers.get(&id).cloned()
    }

    /// Cached active products by display order
    pub async fn products(&self) -> Vec<Product> {
        let cache = self.cache.read().await;
        let mut products: Vec<Product> = cache
            .products
            .values()
            .filter(|p| p.is_active())
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.display_order(), p.id));
        products
    }

    pub async fn product(&self, id: ProductId) -> Option<Product> {
        self.cache.read().await.products.get(&id).cloned()
    }

    /// Cached invoices, newest first
    pub async fn invoices(&self) -> Vec<Invoice> {
        self.cache.read().await.invoices.clone()
    }

    /// Cached payments, newest first
    pub async fn payments(&self) -> Vec<Payment> {
        self.cache.read().await.payments.clone()
    }

    // ------------------------------------------------------------------
    // Reads against the store
    // ------------------------------------------------------------------

    pub async fn invoice_with_lines(&self, id: InvoiceId) -> Result<InvoiceWithLines, BillingError> {
        let invoice = self
            .store
            .get_invoice(id)
            .await
            .map_err(|e| missing(e, || BillingError::InvoiceNotFound(id)))?;
        let line_items = self.store.line_items(id).await?;
        Ok(InvoiceWithLines { invoice, line_items })
    }

    /// Previews the reference number the next invoice would receive
    pub async fn next_invoice_number(&self) -> Result<InvoiceNumber, BillingError> {
        self.numbering.next().await
    }

    pub async fn price_list(&self, customer_id: CustomerId) -> Result<PriceList, BillingError> {
        self.require_customer(customer_id).await?;
        Ok(self.store.price_list_for_customer(customer_id).await?)
    }

    /// Price list completed with every active product, for editing
    pub async fn editable_prices(&self, customer_id: CustomerId) -> Result<Vec<Price>, BillingError> {
        let list = self.price_list(customer_id).await?;
        let products = self.store.list_products().await?;
        Ok(list.completed_for(&products))
    }

    /// Builds a line item, priced from the customer's list unless a price
    /// is given
    #[instrument(skip(self))]
    pub async fn line_item(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        unit: Unit,
        count: Decimal,
        price: Option<UnitPrice>,
    ) -> Result<LineItem, BillingError> {
        let product = self
            .store
            .get_product(product_id)
            .await
            .map_err(|e| missing(e, || BillingError::ProductNotFound(product_id)))?;

        let unit_price = match price {
            Some(price) => price,
            None => self
                .price_list(customer_id)
                .await?
                .default_line_price(product_id, unit)
                .inspect_err(|e| warn!(error = %e, "Cannot price line item"))?,
        };

        LineItem::new(&product, unit, count, unit_price)
    }

    // ------------------------------------------------------------------
    // Customers, prices and products
    // ------------------------------------------------------------------

    /// Creates a customer together with its price list
    #[instrument(skip(self, details, prices), fields(name = %details.name))]
    pub async fn create_customer(
        &self,
        details: CustomerDetails,
        prices: Vec<Price>,
    ) -> Result<Customer, BillingError> {
        let customer = self.store.insert_customer(details).await?;
        self.store
            .upsert_prices(&assign_customer(customer.id, prices))
            .await?;

        info!(customer_id = %customer.id, "Created customer");
        self.refresh().await?;
        Ok(customer)
    }

    /// Updates a customer's details and upserts its prices
    #[instrument(skip(self, details, prices))]
    pub async fn update_customer(
        &self,
        id: CustomerId,
        details: CustomerDetails,
        prices: Vec<Price>,
    ) -> Result<Customer, BillingError> {
        let customer = self
            .store
            .update_customer(id, details)
            .await
            .map_err(|e| missing(e, || BillingError::CustomerNotFound(id)))?;
        self.store.upsert_prices(&assign_customer(id, prices)).await?;

        self.refresh().await?;
        Ok(customer)
    }

    #[instrument(skip(self, details), fields(name = %details.name))]
    pub async fn create_product(&self, details: ProductDetails) -> Result<Product, BillingError> {
        let product = self.store.insert_product(details).await?;
        self.refresh().await?;
        Ok(product)
    }

    #[instrument(skip(self, details))]
    pub async fn update_product(
        &self,
        id: ProductId,
        details: ProductDetails,
    ) -> Result<Product, BillingError> {
        let product = self
            .store
            .update_product(id, details)
            .await
            .map_err(|e| missing(e, || BillingError::ProductNotFound(id)))?;
        self.refresh().await?;
        Ok(product)
    }

    // ------------------------------------------------------------------
    // Invoices
    // ------------------------------------------------------------------

    /// Saves a new invoice
    ///
    /// The store assigns the reference number at insert time. The customer's
    /// balances are then reconciled and the lines compared with the price
    /// list. A missing price-list entry fails the call after the invoice has
    /// been saved and reconciled.
    #[instrument(skip(self, draft), fields(customer_id = %draft.customer_id))]
    pub async fn create_invoice(&self, draft: InvoiceDraft) -> Result<SavedInvoice, BillingError> {
        self.require_customer(draft.customer_id).await?;
        let new_invoice = draft.into_new_invoice()?;

        let inserted = self
            .store
            .insert_invoice(new_invoice, self.clock.current_year())
            .await?;
        info!(invoice_id = %inserted.id, ref_no = %inserted.ref_no, "Created invoice");

        let report = self.reconciler.reconcile(inserted.customer_id).await?;
        self.finish_invoice(inserted.id, vec![report]).await
    }

    /// Replaces an invoice's date, customer and lines
    ///
    /// Balances are reconciled for the new customer and, if it changed, for
    /// the previous one too.
    #[instrument(skip(self, draft))]
    pub async fn update_invoice(
        &self,
        id: InvoiceId,
        draft: InvoiceDraft,
    ) -> Result<SavedInvoice, BillingError> {
        let previous = self
            .store
            .get_invoice(id)
            .await
            .map_err(|e| missing(e, || BillingError::InvoiceNotFound(id)))?;
        self.require_customer(draft.customer_id).await?;

        let updated = self.store.update_invoice(id, draft.into_new_invoice()?).await?;
        info!(invoice_id = %id, ref_no = %updated.ref_no, "Updated invoice");

        let reconciliations = self
            .reconcile_affected(previous.customer_id, updated.customer_id)
            .await?;
        self.finish_invoice(id, reconciliations).await
    }

    async fn finish_invoice(
        &self,
        id: InvoiceId,
        reconciliations: Vec<ReconciliationReport>,
    ) -> Result<SavedInvoice, BillingError> {
        let InvoiceWithLines { invoice, line_items } = self.invoice_with_lines(id).await?;
        self.refresh().await?;

        let price_list = self.store.price_list_for_customer(invoice.customer_id).await?;
        let price_changes = detect_price_changes(&line_items, &price_list).inspect_err(|e| {
            warn!(invoice_id = %id, error = %e, "Price change detection failed");
        })?;
        if !price_changes.is_empty() {
            info!(invoice_id = %id, changes = price_changes.len(), "Invoice deviates from price list");
        }

        Ok(SavedInvoice {
            invoice,
            line_items,
            reconciliations,
            price_changes,
        })
    }

    /// Writes accepted price changes back to the price lists
    ///
    /// Changes are merged per product first; a later change to the same unit
    /// wins.
    #[instrument(skip(self, changes), fields(changes = changes.len()))]
    pub async fn accept_price_changes(&self, changes: &[PriceChange]) -> Result<Vec<Price>, BillingError> {
        let merged = merge_price_changes(changes);
        if !merged.is_empty() {
            self.store.upsert_prices(&merged).await?;
            info!(prices = merged.len(), "Updated price list from invoice");
        }
        Ok(merged)
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    #[instrument(skip(self, payment), fields(customer_id = %payment.customer_id))]
    pub async fn record_payment(&self, payment: NewPayment) -> Result<SavedPayment, BillingError> {
        self.validate_payment(&payment).await?;

        let stored = self.store.insert_payment(payment).await?;
        info!(payment_id = %stored.id, amount = %stored.amount, "Recorded payment");

        let report = self.reconciler.reconcile(stored.customer_id).await?;
        self.finish_payment(stored.id, vec![report]).await
    }

    #[instrument(skip(self, payment))]
    pub async fn update_payment(
        &self,
        id: PaymentId,
        payment: NewPayment,
    ) -> Result<SavedPayment, BillingError> {
        let previous = self
            .store
            .get_payment(id)
            .await
            .map_err(|e| missing(e, || BillingError::PaymentNotFound(id)))?;
        self.validate_payment(&payment).await?;

        let updated = self.store.update_payment(id, payment).await?;
        info!(payment_id = %id, "Updated payment");

        let reconciliations = self
            .reconcile_affected(previous.customer_id, updated.customer_id)
            .await?;
        self.finish_payment(id, reconciliations).await
    }

    async fn finish_payment(
        &self,
        id: PaymentId,
        reconciliations: Vec<ReconciliationReport>,
    ) -> Result<SavedPayment, BillingError> {
        let payment = self.store.get_payment(id).await?;
        self.refresh().await?;
        Ok(SavedPayment {
            payment,
            reconciliations,
        })
    }

    async fn validate_payment(&self, payment: &NewPayment) -> Result<(), BillingError> {
        payment.validate()?;
        self.require_customer(payment.customer_id).await?;

        if let Some(invoice_id) = payment.invoice_id {
            let invoice = self
                .store
                .get_invoice(invoice_id)
                .await
                .map_err(|e| missing(e, || BillingError::InvoiceNotFound(invoice_id)))?;
            if invoice.customer_id != payment.customer_id {
                return Err(BillingError::InvalidPayment(format!(
                    "invoice {} belongs to customer {}, not {}",
                    invoice.ref_no, invoice.customer_id, payment.customer_id
                )));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Balances
    // ------------------------------------------------------------------

    /// Recomputes a customer's balances on demand
    #[instrument(skip(self))]
    pub async fn recalculate(&self, customer_id: CustomerId) -> Result<ReconciliationReport, BillingError> {
        self.require_customer(customer_id).await?;
        let report = self.reconciler.reconcile(customer_id).await?;
        self.refresh().await?;
        Ok(report)
    }

    async fn reconcile_affected(
        &self,
        previous: CustomerId,
        current: CustomerId,
    ) -> Result<Vec<ReconciliationReport>, BillingError> {
        let mut reports = vec![self.reconciler.reconcile(current).await?];
        if previous != current {
            reports.push(self.reconciler.reconcile(previous).await?);
        }
        Ok(reports)
    }

    async fn require_customer(&self, id: CustomerId) -> Result<Customer, BillingError> {
        self.store
            .get_customer(id)
            .await
            .map_err(|e| missing(e, || BillingError::CustomerNotFound(id)))
    }
}

/// Maps a store-level not-found to the domain error naming the record
fn missing(error: PortError, not_found: impl FnOnce() -> BillingError) -> BillingError {
    if error.is_not_found() {
        not_found()
    } else {
        BillingError::Port(error)
    }
}

fn assign_customer(customer_id: CustomerId, prices: Vec<Price>) -> Vec<Price> {
    prices
        .into_iter()
        .map(|price| Price {
            customer_id,
            ..price
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::InMemoryBillingStore;
    use chrono::NaiveDate;
    use core_kernel::FixedClock;

    fn service() -> BillingService<InMemoryBillingStore> {
        let clock = FixedClock(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        BillingService::new(Arc::new(InMemoryBillingStore::new()), Arc::new(clock))
    }

    #[tokio::test]
    async fn test_unknown_customer_is_reported() {
        let service = service();
        let err = service.recalculate(CustomerId::new(77)).await.unwrap_err();
        assert!(matches!(err, BillingError::CustomerNotFound(id) if id == CustomerId::new(77)));
    }

    #[tokio::test]
    async fn test_first_number_preview() {
        let service = service();
        assert_eq!(service.next_invoice_number().await.unwrap().to_string(), "1/24");
    }

    #[tokio::test]
    async fn test_cache_is_empty_until_refreshed() {
        let service = service();
        assert!(service.customers().await.is_empty());
        service.refresh().await.unwrap();
        assert!(service.invoices().await.is_empty());
    }
}
