//! Customer payments

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, InvoiceId, Money, PaymentId};

use crate::error::BillingError;

/// A payment not yet persisted, or the new contents of an edited one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPayment {
    pub customer_id: CustomerId,
    /// Invoice the payment settles; `None` applies it against the balance
    pub invoice_id: Option<InvoiceId>,
    pub date: NaiveDate,
    pub amount: Money,
}

impl NewPayment {
    pub fn new(customer_id: CustomerId, date: NaiveDate, amount: Money) -> Self {
        Self {
            customer_id,
            invoice_id: None,
            date,
            amount,
        }
    }

    pub fn settling(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    /// Rejects zero and negative amounts
    pub fn validate(&self) -> Result<(), BillingError> {
        if !self.amount.is_positive() {
            return Err(BillingError::InvalidPayment(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        Ok(())
    }
}

/// A stored payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub customer_id: CustomerId,
    pub invoice_id: Option<InvoiceId>,
    pub date: NaiveDate,
    pub amount: Money,
    /// Customer balance after this payment
    pub balance: Money,
}

impl Payment {
    pub fn is_linked(&self) -> bool {
        self.invoice_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_rejects_non_positive_amounts() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let customer = CustomerId::new(1);

        assert!(NewPayment::new(customer, date, Money::new(dec!(40))).validate().is_ok());
        assert!(NewPayment::new(customer, date, Money::zero()).validate().is_err());
        assert!(NewPayment::new(customer, date, Money::new(dec!(-5))).validate().is_err());
    }

    #[test]
    fn test_settling_links_invoice() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let payment = NewPayment::new(CustomerId::new(1), date, Money::new(dec!(40)))
            .settling(InvoiceId::new(3));
        assert_eq!(payment.invoice_id, Some(InvoiceId::new(3)));
    }
}
