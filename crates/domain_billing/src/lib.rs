//! Billing Domain - Invoices, payments and running customer balances
//!
//! This crate holds the bookkeeping core of the invoicing system:
//!
//! - **Model**: customers, products, per-customer price lists, invoices with
//!   line items, and payments
//! - **Ledger entries**: invoices and payments seen uniformly as
//!   transactions that move a customer's balance
//! - **Reconciliation**: recomputes the running balance stored on every
//!   invoice, payment and customer, writing only what changed
//! - **Numbering**: `<n>/<yy>` reference numbers that restart every year
//! - **Price change detection**: flags lines sold at other than list price
//!
//! Persistence is reached through the traits in [`ports`];
//! [`services::BillingService`] orchestrates them.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingService, InvoiceDraft};
//!
//! let service = BillingService::new(store, clock);
//! let mut draft = InvoiceDraft::for_customer(&customer, today);
//! draft.add_line(service.line_item(customer.id, bread.id, Unit::Piece, dec!(3), None).await?);
//!
//! let saved = service.create_invoice(draft).await?;
//! if !saved.price_changes.is_empty() {
//!     service.accept_price_changes(&saved.price_changes).await?;
//! }
//! ```

pub mod customer;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod numbering;
pub mod payment;
pub mod ports;
pub mod price;
pub mod price_change;
pub mod product;
pub mod reconciliation;
pub mod services;

pub use customer::{Customer, CustomerDetails, DeliveryAddress, DEFAULT_PAYMENT_TERMS_DAYS};
pub use error::BillingError;
pub use invoice::{Invoice, InvoiceDraft, InvoiceTotals, InvoiceWithLines, LineItem, NewInvoice};
pub use ledger::{sort_chronologically, EntryKind, EntryRef, LedgerEntry};
pub use numbering::{next_invoice_number, InvoiceNumber, InvoiceNumbering, LatestInvoice};
pub use payment::{NewPayment, Payment};
pub use ports::{BillingStore, InvoiceNumberPort, LedgerPort, PricePort};
pub use price::{Price, PriceList, UnitPrice};
pub use price_change::{detect_price_changes, merge_price_changes, PriceChange};
pub use product::{Product, ProductDetails, Unit};
pub use reconciliation::{
    plan_reconciliation, BalanceReconciler, BalanceUpdate, ReconciliationPlan, ReconciliationReport,
};
pub use services::{BillingService, SavedInvoice, SavedPayment};
