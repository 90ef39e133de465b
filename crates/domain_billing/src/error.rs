//! Billing domain errors

use thiserror::Error;

use core_kernel::{CustomerId, InvoiceId, MoneyError, PaymentId, PortError, ProductId, TemporalError};

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// A line item references a product the customer has no price for
    #[error("No price-list entry for product {product_id} of customer {customer_id}")]
    MissingPrice {
        customer_id: CustomerId,
        product_id: ProductId,
    },

    /// A stored reference number is not of the form `<n>/<yy>`
    #[error("Malformed invoice reference number: {0:?}")]
    InvalidInvoiceNumber(String),

    /// Customer not found
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Invoice not found
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// Payment not found
    #[error("Payment not found: {0}")]
    PaymentNotFound(PaymentId),

    /// Invoice without line items
    #[error("Invoice has no line items")]
    EmptyInvoice,

    /// Invalid line item
    #[error("Invalid line item: {0}")]
    InvalidLineItem(String),

    /// Invalid payment
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),

    /// Arithmetic overflow while accumulating balances
    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error(transparent)]
    Temporal(#[from] TemporalError),

    /// Failure reported by the storage layer, passed through unmodified
    #[error(transparent)]
    Port(#[from] PortError),
}

impl BillingError {
    /// Returns true for data-integrity violations that must be surfaced to
    /// the operator rather than retried
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            BillingError::MissingPrice { .. }
                | BillingError::InvalidInvoiceNumber(_)
                | BillingError::Port(PortError::Transformation { .. })
        )
    }

    /// Returns true if the error means the referenced record does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            BillingError::CustomerNotFound(_)
            | BillingError::ProductNotFound(_)
            | BillingError::InvoiceNotFound(_)
            | BillingError::PaymentNotFound(_) => true,
            BillingError::Port(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Returns true if retrying the operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, BillingError::Port(e) if e.is_transient())
    }

    /// Returns true if the request itself was invalid
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::EmptyInvoice
                | BillingError::InvalidLineItem(_)
                | BillingError::InvalidPayment(_)
                | BillingError::Money(_)
                | BillingError::Temporal(_)
                | BillingError::Port(PortError::Validation { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_price_names_product() {
        let error = BillingError::MissingPrice {
            customer_id: CustomerId::new(3),
            product_id: ProductId::new(11),
        };
        assert!(error.is_integrity_violation());
        assert!(error.to_string().contains("PRD-11"));
    }

    #[test]
    fn test_port_errors_pass_through() {
        let error: BillingError = PortError::connection("connection reset").into();
        assert!(!error.is_integrity_violation());
        assert_eq!(error.to_string(), "Connection error: connection reset");
    }

    #[test]
    fn test_not_found_classification() {
        assert!(BillingError::InvoiceNotFound(InvoiceId::new(1)).is_not_found());
        assert!(BillingError::Port(PortError::not_found("Payment", 4)).is_not_found());
        assert!(!BillingError::EmptyInvoice.is_not_found());
    }
}
