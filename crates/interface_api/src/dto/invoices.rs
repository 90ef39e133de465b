//! Invoice DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_billing::{PriceChange, Unit};

use super::{discount_in_range, non_negative, positive};

#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceRequest {
    pub customer_id: i64,
    /// Defaults to today in the business timezone
    pub date: Option<NaiveDate>,
    /// Defaults to the customer's payment terms
    #[validate(range(max = 365))]
    pub payment_terms_days: Option<u32>,
    #[validate(length(min = 1), nested)]
    pub lines: Vec<LineRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LineRequest {
    pub product_id: i64,
    pub unit: Unit,
    #[validate(custom(function = "positive"))]
    pub count: Decimal,
    /// Overrides the customer's list price for this line
    #[validate(nested)]
    pub price: Option<LinePriceRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LinePriceRequest {
    #[validate(custom(function = "non_negative"))]
    pub price: Decimal,
    #[serde(default)]
    #[validate(custom(function = "discount_in_range"))]
    pub discount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AcceptPriceChangesRequest {
    pub changes: Vec<PriceChange>,
}

#[derive(Debug, Serialize)]
pub struct NextNumberResponse {
    pub ref_no: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invoice_needs_at_least_one_line() {
        let request: InvoiceRequest =
            serde_json::from_value(json!({ "customer_id": 1, "lines": [] })).unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("lines"));
    }

    #[test]
    fn test_line_errors_are_reported() {
        let request: InvoiceRequest = serde_json::from_value(json!({
            "customer_id": 1,
            "lines": [{
                "product_id": 2,
                "unit": "bulk",
                "count": "1.5",
                "price": { "price": "12.40", "discount": "150" }
            }]
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_valid_invoice_request() {
        let request: InvoiceRequest = serde_json::from_value(json!({
            "customer_id": 1,
            "date": "2024-04-01",
            "lines": [{ "product_id": 2, "unit": "piece", "count": "3" }]
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(request.lines[0].price.is_none());
    }
}
