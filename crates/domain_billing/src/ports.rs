//! Port definitions for the billing domain
//!
//! The reconciliation engine, numbering service and price change detector
//! consume the narrow ports below. `BillingStore` bundles them with the CRUD
//! operations the orchestration service needs.

use async_trait::async_trait;

use core_kernel::{
    CustomerId, DomainPort, HealthCheckable, InvoiceId, Money, PaymentId, PortError, ProductId,
};

use crate::customer::{Customer, CustomerDetails};
use crate::invoice::{Invoice, LineItem, NewInvoice};
use crate::ledger::LedgerEntry;
use crate::numbering::LatestInvoice;
use crate::payment::{NewPayment, Payment};
use crate::price::{Price, PriceList};
use crate::product::{Product, ProductDetails};

/// Read and single-field write access to balances
#[async_trait]
pub trait LedgerPort: DomainPort {
    /// Returns every invoice and payment of the customer, unfiltered
    async fn transactions_for_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<LedgerEntry>, PortError>;

    /// Returns the customer's stored balance
    async fn customer_balance(&self, customer_id: CustomerId) -> Result<Money, PortError>;

    async fn update_invoice_balance(&self, id: InvoiceId, balance: Money) -> Result<(), PortError>;

    async fn update_payment_balance(&self, id: PaymentId, balance: Money) -> Result<(), PortError>;

    async fn update_customer_balance(&self, id: CustomerId, balance: Money) -> Result<(), PortError>;
}

/// Access to the most recently created invoice
#[async_trait]
pub trait InvoiceNumberPort: DomainPort {
    /// Returns the invoice with the highest id, if any
    async fn latest_invoice(&self) -> Result<Option<LatestInvoice>, PortError>;
}

/// Access to customer price lists
#[async_trait]
pub trait PricePort: DomainPort {
    async fn price_list_for_customer(&self, customer_id: CustomerId) -> Result<PriceList, PortError>;

    /// Inserts or replaces entries keyed by (customer, product)
    async fn upsert_prices(&self, prices: &[Price]) -> Result<(), PortError>;
}

/// Full persistence interface used by the billing service
#[async_trait]
pub trait BillingStore: LedgerPort + InvoiceNumberPort + PricePort + HealthCheckable {
    async fn list_customers(&self) -> Result<Vec<Customer>, PortError>;

    async fn get_customer(&self, id: CustomerId) -> Result<Customer, PortError>;

    async fn insert_customer(&self, details: CustomerDetails) -> Result<Customer, PortError>;

    async fn update_customer(
        &self,
        id: CustomerId,
        details: CustomerDetails,
    ) -> Result<Customer, PortError>;

    /// Returns all products, active or not, by display order
    async fn list_products(&self) -> Result<Vec<Product>, PortError>;

    async fn get_product(&self, id: ProductId) -> Result<Product, PortError>;

    async fn insert_product(&self, details: ProductDetails) -> Result<Product, PortError>;

    async fn update_product(&self, id: ProductId, details: ProductDetails) -> Result<Product, PortError>;

    /// Returns invoice headers, newest first
    async fn list_invoices(&self) -> Result<Vec<Invoice>, PortError>;

    async fn get_invoice(&self, id: InvoiceId) -> Result<Invoice, PortError>;

    /// Returns the line items of an invoice by position
    async fn line_items(&self, invoice_id: InvoiceId) -> Result<Vec<LineItem>, PortError>;

    /// Inserts an invoice, assigning the next reference number of `year`
    ///
    /// Numbering and insertion happen atomically with respect to other
    /// inserts.
    async fn insert_invoice(&self, invoice: NewInvoice, year: i32) -> Result<Invoice, PortError>;

    /// Replaces an invoice's header fields and line items, keeping its
    /// reference number
    async fn update_invoice(&self, id: InvoiceId, invoice: NewInvoice) -> Result<Invoice, PortError>;

    /// Returns payments, newest first
    async fn list_payments(&self) -> Result<Vec<Payment>, PortError>;

    async fn get_payment(&self, id: PaymentId) -> Result<Payment, PortError>;

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PortError>;

    async fn update_payment(&self, id: PaymentId, payment: NewPayment) -> Result<Payment, PortError>;
}

/// In-memory store for tests and demos
#[cfg(any(test, feature = "mock"))]
pub mod mock;
