//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! invoicing test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for customers, products, prices and dates
//! - `builders`: Builder patterns for test data construction
//! - `database`: Disposable PostgreSQL containers for adapter tests
//! - `assertions`: Assertion helpers for balances and money
//! - `generators`: Property-based test data generators

pub mod assertions;
pub mod builders;
pub mod database;
pub mod fixtures;
pub mod generators;

pub use assertions::*;
pub use builders::*;
pub use database::*;
pub use fixtures::*;
pub use generators::*;
