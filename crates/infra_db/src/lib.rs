//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the invoicing system, built on SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: repositories own the SQL and
//! return row types, and [`adapters::PostgresBillingAdapter`] implements the
//! domain's ports on top of them.
//!
//! Invoice numbers are assigned inside the insert transaction while holding
//! a transaction-scoped advisory lock, so concurrent inserts never observe
//! the same latest invoice.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillingAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/invoicing")).await?;
//! run_migrations(&pool).await?;
//! let adapter = PostgresBillingAdapter::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresBillingAdapter;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
