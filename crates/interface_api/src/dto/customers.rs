//! Customer and price-list DTOs

use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use core_kernel::{CustomerId, ProductId};
use domain_billing::{CustomerDetails, DeliveryAddress, Price, UnitPrice, DEFAULT_PAYMENT_TERMS_DAYS};

use super::{discount_in_range, money, non_negative, percentage};
use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct CustomerRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub tax_id: String,
    #[serde(default)]
    pub registration_no: String,
    #[serde(default)]
    pub bank_account: String,
    #[validate(range(max = 365))]
    pub payment_terms_days: Option<u32>,
    #[serde(default)]
    pub delivery_name: String,
    #[serde(default)]
    pub delivery_street: String,
    pub delivery_city: Option<String>,
    pub active: Option<bool>,
    #[serde(default)]
    #[validate(nested)]
    pub prices: Vec<PriceRequest>,
}

impl CustomerRequest {
    pub fn into_parts(self) -> Result<(CustomerDetails, Vec<Price>), ApiError> {
        // Prices are reassigned to the saved customer by the service
        let placeholder = CustomerId::new(0);
        let prices = self
            .prices
            .into_iter()
            .map(|p| p.into_price(placeholder))
            .collect::<Result<Vec<_>, _>>()?;

        let details = CustomerDetails {
            name: self.name,
            address: self.address,
            tax_id: self.tax_id,
            registration_no: self.registration_no,
            bank_account: self.bank_account,
            payment_terms_days: self.payment_terms_days.unwrap_or(DEFAULT_PAYMENT_TERMS_DAYS),
            delivery: DeliveryAddress {
                name: self.delivery_name,
                street: self.delivery_street,
                city: self.delivery_city,
            },
            active: self.active.unwrap_or(true),
        };

        Ok((details, prices))
    }
}

/// One price-list entry as entered by the user
#[derive(Debug, Deserialize, Validate)]
pub struct PriceRequest {
    pub product_id: i64,
    #[validate(custom(function = "non_negative"))]
    pub piece_price: Decimal,
    #[serde(default)]
    #[validate(custom(function = "discount_in_range"))]
    pub piece_discount: Decimal,
    #[validate(custom(function = "non_negative"))]
    pub bulk_price: Decimal,
    #[serde(default)]
    #[validate(custom(function = "discount_in_range"))]
    pub bulk_discount: Decimal,
}

impl PriceRequest {
    pub fn into_price(self, customer_id: CustomerId) -> Result<Price, ApiError> {
        Ok(Price {
            customer_id,
            product_id: ProductId::new(self.product_id),
            piece: UnitPrice::new(money(self.piece_price), percentage(self.piece_discount)?),
            bulk: UnitPrice::new(money(self.bulk_price), percentage(self.bulk_discount)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_customer_gets_defaults() {
        let request: CustomerRequest = serde_json::from_value(json!({ "name": "Corner Bakery" })).unwrap();
        assert!(request.validate().is_ok());

        let (details, prices) = request.into_parts().unwrap();
        assert_eq!(details.payment_terms_days, DEFAULT_PAYMENT_TERMS_DAYS);
        assert!(details.active);
        assert!(prices.is_empty());
    }

    #[test]
    fn test_discount_over_hundred_fails_validation() {
        let request: CustomerRequest = serde_json::from_value(json!({
            "name": "Corner Bakery",
            "prices": [{ "product_id": 1, "piece_price": "10", "piece_discount": "120", "bulk_price": "0" }]
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_empty_name_fails_validation() {
        let request: CustomerRequest = serde_json::from_value(json!({ "name": "" })).unwrap();
        assert!(request.validate().is_err());
    }
}
