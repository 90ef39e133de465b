//! Core Kernel - Foundational types and utilities for the invoicing system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Money and discount percentages with precise decimal arithmetic
//! - Integer-backed identifiers for customers, products, invoices and payments
//! - Business timezone and clock abstractions
//! - Port infrastructure for the domain/storage boundary

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, MoneyError, Percentage};
pub use temporal::{add_days, Clock, FixedClock, SystemClock, TemporalError, Timezone};
pub use identifiers::{CustomerId, InvoiceId, PaymentId, ProductId};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
