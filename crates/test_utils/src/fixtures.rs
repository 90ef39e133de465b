//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the invoicing system. Fixtures are
//! deterministic unless the name says otherwise (`random_*`).

use chrono::NaiveDate;
use fake::faker::address::en::{CityName, StreetName};
use fake::faker::company::en::CompanyName;
use fake::Fake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{CustomerId, InvoiceId, Money, PaymentId, Percentage, ProductId};
use domain_billing::{
    CustomerDetails, DeliveryAddress, Price, ProductDetails, UnitPrice,
    DEFAULT_PAYMENT_TERMS_DAYS,
};

/// Builds a date, panicking on invalid input
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid fixture date {year}-{month}-{day}"))
}

/// Fixture for money values
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn amount(value: Decimal) -> Money {
        Money::new(value)
    }

    pub fn hundred() -> Money {
        Money::new(dec!(100))
    }

    pub fn forty() -> Money {
        Money::new(dec!(40))
    }

    pub fn percent(value: Decimal) -> Percentage {
        Percentage::new(value).unwrap_or_else(|e| panic!("invalid fixture percentage: {e}"))
    }
}

/// Fixture for dates used across tests
pub struct DateFixtures;

impl DateFixtures {
    /// Default "today" of service tests
    pub fn today() -> NaiveDate {
        date(2024, 5, 1)
    }

    pub fn year_end_2024() -> NaiveDate {
        date(2024, 12, 31)
    }

    pub fn new_year_2025() -> NaiveDate {
        date(2025, 1, 2)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn customer() -> CustomerId {
        CustomerId::new(1)
    }

    pub fn product() -> ProductId {
        ProductId::new(1)
    }

    pub fn invoice(id: i64) -> InvoiceId {
        InvoiceId::new(id)
    }

    pub fn payment(id: i64) -> PaymentId {
        PaymentId::new(id)
    }
}

/// Fixture for customers
pub struct CustomerFixtures;

impl CustomerFixtures {
    /// A bakery customer with standard 30-day terms
    pub fn bakery() -> CustomerDetails {
        Self::named("Corner Bakery")
    }

    /// A café customer paying within 14 days
    pub fn cafe() -> CustomerDetails {
        CustomerDetails {
            payment_terms_days: 14,
            ..Self::named("Harbour Café")
        }
    }

    pub fn named(name: &str) -> CustomerDetails {
        CustomerDetails {
            name: name.to_string(),
            address: "1 Market Street".to_string(),
            tax_id: "TX-1001".to_string(),
            registration_no: "REG-2001".to_string(),
            bank_account: "0001-0002-0003".to_string(),
            payment_terms_days: DEFAULT_PAYMENT_TERMS_DAYS,
            delivery: DeliveryAddress {
                name: name.to_string(),
                street: "1 Market Street".to_string(),
                city: Some("Springfield".to_string()),
            },
            active: true,
        }
    }

    /// A customer with generated name and addresses
    pub fn random() -> CustomerDetails {
        let name: String = CompanyName().fake();
        let street: String = StreetName().fake();
        let city: String = CityName().fake();
        CustomerDetails {
            address: street.clone(),
            delivery: DeliveryAddress {
                name: name.clone(),
                street,
                city: Some(city),
            },
            ..Self::named(&name)
        }
    }
}

/// Fixture for catalogue products
pub struct ProductFixtures;

impl ProductFixtures {
    pub fn bread() -> ProductDetails {
        ProductDetails {
            name: "White Bread".to_string(),
            short_name: "Bread".to_string(),
            piece_suffix: "500g".to_string(),
            bulk_suffix: "crate".to_string(),
            piece_barcode: "3800000000011".to_string(),
            bulk_barcode: Some("3800000000028".to_string()),
            active: true,
            display_order: 1,
        }
    }

    pub fn rolls() -> ProductDetails {
        ProductDetails {
            name: "Rolls".to_string(),
            short_name: "Rolls".to_string(),
            piece_suffix: String::new(),
            bulk_suffix: "kg".to_string(),
            piece_barcode: "3800000000035".to_string(),
            bulk_barcode: None,
            active: true,
            display_order: 2,
        }
    }

    pub fn discontinued() -> ProductDetails {
        ProductDetails {
            name: "Rye Loaf".to_string(),
            short_name: "Rye".to_string(),
            active: false,
            display_order: 3,
            ..Self::rolls()
        }
    }
}

/// Fixture for price-list entries
pub struct PriceFixtures;

impl PriceFixtures {
    pub fn unit_price(price: Decimal, discount: Decimal) -> UnitPrice {
        UnitPrice::new(Money::new(price), MoneyFixtures::percent(discount))
    }

    /// An entry with both units priced
    pub fn entry(
        customer_id: CustomerId,
        product_id: ProductId,
        piece: UnitPrice,
        bulk: UnitPrice,
    ) -> Price {
        Price {
            customer_id,
            product_id,
            piece,
            bulk,
        }
    }

    /// Piece 100.00 less 5%, bulk 40.00 net
    pub fn standard(customer_id: CustomerId, product_id: ProductId) -> Price {
        Self::entry(
            customer_id,
            product_id,
            Self::unit_price(dec!(100), dec!(5)),
            Self::unit_price(dec!(40), dec!(0)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_dates() {
        assert!(DateFixtures::today() < DateFixtures::new_year_2025());
    }

    #[test]
    fn test_random_customer_is_active() {
        let customer = CustomerFixtures::random();
        assert!(customer.active);
        assert!(!customer.name.is_empty());
    }

    #[test]
    fn test_standard_price() {
        let price = PriceFixtures::standard(IdFixtures::customer(), IdFixtures::product());
        assert_eq!(price.piece.net(), Money::new(dec!(95)));
    }
}
