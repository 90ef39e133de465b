//! Domain Adapters
//!
//! Adapter implementations of the billing ports on top of the PostgreSQL
//! repositories. An adapter:
//! - Implements the domain's port traits
//! - Translates between domain models and database row types
//! - Maps database errors onto `PortError`
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresBillingAdapter;
//! use domain_billing::LedgerPort;
//!
//! let adapter = PostgresBillingAdapter::new(pool);
//! let entries = adapter.transactions_for_customer(customer_id).await?;
//! ```

pub mod billing;

pub use billing::PostgresBillingAdapter;
