//! Customer price lists

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{CustomerId, Money, Percentage, ProductId};

use crate::error::BillingError;
use crate::product::{Product, Unit};

/// Price and discount for one unit of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitPrice {
    pub price: Money,
    pub discount: Percentage,
}

impl UnitPrice {
    pub fn new(price: Money, discount: Percentage) -> Self {
        Self { price, discount }
    }

    /// Unit price after the discount is applied
    pub fn net(&self) -> Money {
        self.price.discounted(self.discount)
    }
}

/// Price-list entry of one product for one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub piece: UnitPrice,
    pub bulk: UnitPrice,
}

impl Price {
    /// Entry with zero prices and no discount
    pub fn zero(customer_id: CustomerId, product_id: ProductId) -> Self {
        Self {
            customer_id,
            product_id,
            piece: UnitPrice::default(),
            bulk: UnitPrice::default(),
        }
    }

    /// Returns the price and discount for the given unit
    pub fn for_unit(&self, unit: Unit) -> UnitPrice {
        match unit {
            Unit::Piece => self.piece,
            Unit::Bulk => self.bulk,
        }
    }

    /// Returns a copy with only the given unit's price and discount replaced
    pub fn with_unit(&self, unit: Unit, unit_price: UnitPrice) -> Self {
        let mut updated = self.clone();
        match unit {
            Unit::Piece => updated.piece = unit_price,
            Unit::Bulk => updated.bulk = unit_price,
        }
        updated
    }
}

/// All price-list entries of one customer, indexed by product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceList {
    customer_id: CustomerId,
    entries: HashMap<ProductId, Price>,
}

impl PriceList {
    /// Builds a price list; entries for other customers are ignored
    pub fn new(customer_id: CustomerId, prices: impl IntoIterator<Item = Price>) -> Self {
        let entries = prices
            .into_iter()
            .filter(|price| price.customer_id == customer_id)
            .map(|price| (price.product_id, price))
            .collect();
        Self {
            customer_id,
            entries,
        }
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn get(&self, product_id: ProductId) -> Option<&Price> {
        self.entries.get(&product_id)
    }

    /// Looks up the entry of a product offered to this customer
    ///
    /// # Errors
    ///
    /// Returns `BillingError::MissingPrice` if the customer has no entry for
    /// the product.
    pub fn require(&self, product_id: ProductId) -> Result<&Price, BillingError> {
        self.entries.get(&product_id).ok_or(BillingError::MissingPrice {
            customer_id: self.customer_id,
            product_id,
        })
    }

    /// Price and discount a new line item starts with
    pub fn default_line_price(&self, product_id: ProductId, unit: Unit) -> Result<UnitPrice, BillingError> {
        Ok(self.require(product_id)?.for_unit(unit))
    }

    /// Entries to show when editing this customer's prices
    ///
    /// Inactive products are left out and every active product without an
    /// entry gets a zero one. The result follows the products' display order.
    pub fn completed_for(&self, products: &[Product]) -> Vec<Price> {
        let mut active: Vec<&Product> = products.iter().filter(|p| p.is_active()).collect();
        active.sort_by_key(|p| (p.display_order(), p.id));

        active
            .into_iter()
            .map(|product| {
                self.entries
                    .get(&product.id)
                    .cloned()
                    .unwrap_or_else(|| Price::zero(self.customer_id, product.id))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by product id
    pub fn prices(&self) -> Vec<Price> {
        let mut prices: Vec<Price> = self.entries.values().cloned().collect();
        prices.sort_by_key(|p| p.product_id);
        prices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductDetails;
    use rust_decimal_macros::dec;

    fn product(id: i64, display_order: i32, active: bool) -> Product {
        Product::new(
            ProductId::new(id),
            ProductDetails {
                name: format!("Product {id}"),
                short_name: format!("P{id}"),
                piece_suffix: String::new(),
                bulk_suffix: String::new(),
                piece_barcode: format!("{id:013}"),
                bulk_barcode: None,
                active,
                display_order,
            },
        )
    }

    fn unit_price(price: rust_decimal::Decimal, discount: rust_decimal::Decimal) -> UnitPrice {
        UnitPrice::new(Money::new(price), Percentage::new(discount).unwrap())
    }

    #[test]
    fn test_with_unit_replaces_only_that_unit() {
        let customer = CustomerId::new(1);
        let mut price = Price::zero(customer, ProductId::new(2));
        price.bulk = unit_price(dec!(40), dec!(0));

        let updated = price.with_unit(Unit::Piece, unit_price(dec!(110), dec!(5)));

        assert_eq!(updated.piece, unit_price(dec!(110), dec!(5)));
        assert_eq!(updated.bulk, price.bulk);
    }

    #[test]
    fn test_missing_entry_is_integrity_error() {
        let list = PriceList::new(CustomerId::new(1), Vec::new());
        let err = list.default_line_price(ProductId::new(9), Unit::Piece).unwrap_err();

        assert!(err.is_integrity_violation());
        assert!(matches!(err, BillingError::MissingPrice { product_id, .. } if product_id == ProductId::new(9)));
    }

    #[test]
    fn test_other_customers_entries_are_ignored() {
        let list = PriceList::new(
            CustomerId::new(1),
            vec![Price::zero(CustomerId::new(2), ProductId::new(5))],
        );
        assert!(list.is_empty());
    }

    #[test]
    fn test_completion_hides_inactive_and_fills_missing() {
        let customer = CustomerId::new(1);
        let mut existing = Price::zero(customer, ProductId::new(1));
        existing.piece = unit_price(dec!(100), dec!(5));
        let list = PriceList::new(
            customer,
            vec![existing.clone(), Price::zero(customer, ProductId::new(3))],
        );

        let products = vec![product(1, 2, true), product(2, 1, true), product(3, 3, false)];
        let completed = list.completed_for(&products);

        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0], Price::zero(customer, ProductId::new(2)));
        assert_eq!(completed[1], existing);
    }

    #[test]
    fn test_net_unit_price() {
        assert_eq!(unit_price(dec!(100), dec!(5)).net(), Money::new(dec!(95)));
    }
}
