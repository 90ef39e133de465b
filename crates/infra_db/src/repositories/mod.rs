//! Repository implementations for the invoicing tables
//!
//! Repositories encapsulate SQL and return plain row types; conversion to
//! domain types happens in the adapters. Queries are checked at runtime
//! (`query_as` with `FromRow`), so building the crate needs no database.

pub mod customers;
pub mod invoices;
pub mod ledger;
pub mod payments;
pub mod prices;
pub mod products;

pub use customers::CustomerRepository;
pub use invoices::InvoiceRepository;
pub use ledger::LedgerRepository;
pub use payments::PaymentRepository;
pub use prices::PriceRepository;
pub use products::ProductRepository;
