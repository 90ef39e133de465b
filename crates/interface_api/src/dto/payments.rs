//! Payment DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use core_kernel::{CustomerId, InvoiceId, Money};
use domain_billing::NewPayment;

use super::positive;

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    pub customer_id: i64,
    /// Invoice the payment settles, if any
    pub invoice_id: Option<i64>,
    /// Defaults to today in the business timezone
    pub date: Option<NaiveDate>,
    #[validate(custom(function = "positive"))]
    pub amount: Decimal,
}

impl PaymentRequest {
    pub fn into_new_payment(self, today: NaiveDate) -> NewPayment {
        NewPayment {
            customer_id: CustomerId::new(self.customer_id),
            invoice_id: self.invoice_id.map(InvoiceId::new),
            date: self.date.unwrap_or(today),
            amount: Money::new(self.amount),
        }
    }
}
