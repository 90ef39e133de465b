//! Price change detection
//!
//! After an invoice is saved, every line is compared with the customer's
//! price list. Lines sold at a different price or discount than the list
//! says are reported so the operator can decide whether to update the list.
//! Detection never writes anything.

use serde::{Deserialize, Serialize};

use core_kernel::ProductId;

use crate::error::BillingError;
use crate::invoice::LineItem;
use crate::price::{Price, PriceList};
use crate::product::Unit;

/// A line sold at something other than the list price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChange {
    pub product_id: ProductId,
    pub unit: Unit,
    /// The price-list entry as stored
    pub old_price: Price,
    /// The entry with the line's unit price and discount applied
    pub new_price: Price,
}

/// Compares each line item with the customer's price list
///
/// Returns one change per diverging line, in line order. Lines for the same
/// product are compared independently, so the result may name a product more
/// than once.
///
/// # Errors
///
/// Returns `BillingError::MissingPrice` as soon as a line references a product
/// with no price-list entry.
pub fn detect_price_changes(
    line_items: &[LineItem],
    price_list: &PriceList,
) -> Result<Vec<PriceChange>, BillingError> {
    let mut changes = Vec::new();

    for item in line_items {
        let listed = price_list.require(item.product_id)?;
        let applied = item.applied_price();

        if listed.for_unit(item.unit) != applied {
            changes.push(PriceChange {
                product_id: item.product_id,
                unit: item.unit,
                old_price: listed.clone(),
                new_price: listed.with_unit(item.unit, applied),
            });
        }
    }

    Ok(changes)
}

/// Collapses detected changes into one entry per product
///
/// Each change's unit price is applied onto the accumulated entry of its
/// product, so changes to different units combine and a later change to the
/// same unit wins. Products keep the order of their first change.
pub fn merge_price_changes(changes: &[PriceChange]) -> Vec<Price> {
    let mut merged: Vec<Price> = Vec::new();

    for change in changes {
        let applied = change.new_price.for_unit(change.unit);
        match merged.iter_mut().find(|p| p.product_id == change.product_id) {
            Some(price) => *price = price.with_unit(change.unit, applied),
            None => merged.push(change.new_price.clone()),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::price::UnitPrice;
    use core_kernel::{CustomerId, Money, Percentage};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    const CUSTOMER: CustomerId = CustomerId::new(1);

    fn unit_price(price: Decimal, discount: Decimal) -> UnitPrice {
        UnitPrice::new(Money::new(price), Percentage::new(discount).unwrap())
    }

    fn line(product: i64, unit: Unit, price: Decimal, discount: Decimal) -> LineItem {
        let applied = unit_price(price, discount);
        LineItem {
            position: 1,
            product_id: ProductId::new(product),
            name: format!("Product {product}"),
            barcode: None,
            unit,
            count: dec!(1),
            price: applied.price,
            discount: applied.discount,
            amount_before_discount: applied.price,
            amount: applied.net(),
        }
    }

    fn list() -> PriceList {
        let mut price = Price::zero(CUSTOMER, ProductId::new(1));
        price.piece = unit_price(dec!(100), dec!(5));
        price.bulk = unit_price(dec!(40), dec!(0));
        PriceList::new(CUSTOMER, vec![price])
    }

    #[test]
    fn test_changed_piece_price_detected() {
        let changes = detect_price_changes(&[line(1, Unit::Piece, dec!(110), dec!(5))], &list()).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_price.piece.price, Money::new(dec!(100)));
        assert_eq!(changes[0].new_price.piece.price, Money::new(dec!(110)));
        assert_eq!(changes[0].new_price.bulk, changes[0].old_price.bulk);
    }

    #[test]
    fn test_matching_line_reports_nothing() {
        let changes = detect_price_changes(&[line(1, Unit::Piece, dec!(100), dec!(5))], &list()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_discount_only_change_detected() {
        let changes = detect_price_changes(&[line(1, Unit::Bulk, dec!(40), dec!(10))], &list()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_price.bulk, unit_price(dec!(40), dec!(10)));
        assert_eq!(changes[0].new_price.piece, changes[0].old_price.piece);
    }

    #[test]
    fn test_missing_entry_fails() {
        let err = detect_price_changes(&[line(2, Unit::Piece, dec!(1), dec!(0))], &list()).unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn test_duplicates_are_not_collapsed() {
        let lines = [
            line(1, Unit::Piece, dec!(110), dec!(5)),
            line(1, Unit::Piece, dec!(120), dec!(5)),
        ];
        let changes = detect_price_changes(&lines, &list()).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].old_price, changes[1].old_price);
    }

    #[test]
    fn test_merge_combines_units_and_last_wins() {
        let lines = [
            line(1, Unit::Piece, dec!(110), dec!(5)),
            line(1, Unit::Bulk, dec!(45), dec!(0)),
            line(1, Unit::Piece, dec!(120), dec!(5)),
        ];
        let changes = detect_price_changes(&lines, &list()).unwrap();
        let merged = merge_price_changes(&changes);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].piece, unit_price(dec!(120), dec!(5)));
        assert_eq!(merged[0].bulk, unit_price(dec!(45), dec!(0)));
    }
}
