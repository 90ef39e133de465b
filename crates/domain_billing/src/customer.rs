//! Customers and their delivery details

use serde::{Deserialize, Serialize};

use core_kernel::{CustomerId, Money};

/// Payment term applied when a customer has none configured
pub const DEFAULT_PAYMENT_TERMS_DAYS: u32 = 30;

/// Editable customer data
///
/// Used both to create a customer and to update an existing one. The running
/// balance is deliberately absent: only reconciliation writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    /// Legal name printed on invoices
    pub name: String,
    /// Registered address
    pub address: String,
    /// Tax identification number
    pub tax_id: String,
    /// Company registration number
    pub registration_no: String,
    /// Bank account number
    pub bank_account: String,
    /// Days between invoice date and due date
    #[serde(default = "default_payment_terms")]
    pub payment_terms_days: u32,
    /// Where goods are delivered
    pub delivery: DeliveryAddress,
    /// Inactive customers are hidden from selection lists
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_payment_terms() -> u32 {
    DEFAULT_PAYMENT_TERMS_DAYS
}

fn default_active() -> bool {
    true
}

/// Delivery point of a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub name: String,
    pub street: String,
    pub city: Option<String>,
}

/// A customer together with its stored running balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(flatten)]
    pub details: CustomerDetails,
    /// Outstanding amount after the customer's latest transaction
    pub balance: Money,
}

impl Customer {
    /// Creates a customer with a zero balance
    pub fn new(id: CustomerId, details: CustomerDetails) -> Self {
        Self {
            id,
            details,
            balance: Money::zero(),
        }
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn is_active(&self) -> bool {
        self.details.active
    }

    pub fn payment_terms_days(&self) -> u32 {
        self.details.payment_terms_days
    }

    /// Returns true if the customer owes money
    pub fn has_outstanding_balance(&self) -> bool {
        self.balance.is_positive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_terms_default_when_missing() {
        let json = r#"{
            "name": "Mini market",
            "address": "Main street 1",
            "tax_id": "100200300",
            "registration_no": "0712",
            "bank_account": "160-1234-55",
            "delivery": { "name": "Shop 2", "street": "Side street 4", "city": null }
        }"#;

        let details: CustomerDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.payment_terms_days, DEFAULT_PAYMENT_TERMS_DAYS);
        assert!(details.active);
    }
}
