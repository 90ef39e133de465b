//! Invoices and their line items
//!
//! A line item is a snapshot: the price and discount it was sold at are
//! copied from the price list when the line is created and never follow
//! later price-list changes.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::temporal::add_days;
use core_kernel::{CustomerId, InvoiceId, Money, Percentage, ProductId};

use crate::customer::Customer;
use crate::error::BillingError;
use crate::numbering::InvoiceNumber;
use crate::price::UnitPrice;
use crate::product::{Product, Unit};

/// One position on an invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// 1-based position on the invoice
    pub position: u32,
    pub product_id: ProductId,
    /// Product name with the unit suffix
    pub name: String,
    pub barcode: Option<String>,
    pub unit: Unit,
    /// Pieces, or kilograms for bulk sales
    pub count: Decimal,
    /// Price per unit as applied
    pub price: Money,
    /// Discount as applied
    pub discount: Percentage,
    pub amount_before_discount: Money,
    pub amount: Money,
}

impl LineItem {
    /// Builds a line for `count` units of a product sold at `unit_price`
    ///
    /// The position is assigned when the line is added to a draft.
    pub fn new(
        product: &Product,
        unit: Unit,
        count: Decimal,
        unit_price: UnitPrice,
    ) -> Result<Self, BillingError> {
        if count <= Decimal::ZERO {
            return Err(BillingError::InvalidLineItem(format!(
                "count must be positive, got {count}"
            )));
        }

        let gross = unit_price
            .price
            .amount()
            .checked_mul(count)
            .ok_or_else(|| BillingError::CalculationError(format!("{} x {count}", unit_price.price)))?;
        let net = gross
            .checked_mul(unit_price.discount.remaining_fraction())
            .ok_or_else(|| BillingError::CalculationError(format!("discount on {gross}")))?;

        Ok(Self {
            position: 0,
            product_id: product.id,
            name: product.line_name(unit),
            barcode: product.barcode(unit).map(str::to_string),
            unit,
            count,
            price: unit_price.price,
            discount: unit_price.discount,
            amount_before_discount: Money::new(gross),
            amount: Money::new(net),
        })
    }

    /// The price and discount this line was sold at
    pub fn applied_price(&self) -> UnitPrice {
        UnitPrice::new(self.price, self.discount)
    }

    /// Discount granted on this line
    pub fn discount_amount(&self) -> Money {
        self.amount_before_discount - self.amount
    }
}

/// Aggregate amounts of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub amount_before_discount: Money,
    pub discount: Money,
    pub amount: Money,
}

impl InvoiceTotals {
    /// Sums the line amounts
    ///
    /// # Errors
    ///
    /// Returns `BillingError::CalculationError` if a sum overflows.
    pub fn from_lines(line_items: &[LineItem]) -> Result<Self, BillingError> {
        let mut amount_before_discount = Money::zero();
        let mut amount = Money::zero();
        for line in line_items {
            amount_before_discount = amount_before_discount
                .checked_add(&line.amount_before_discount)
                .map_err(|e| BillingError::CalculationError(format!("invoice total: {e}")))?;
            amount = amount
                .checked_add(&line.amount)
                .map_err(|e| BillingError::CalculationError(format!("invoice total: {e}")))?;
        }
        let discount = amount_before_discount
            .checked_sub(&amount)
            .map_err(|e| BillingError::CalculationError(format!("invoice discount: {e}")))?;
        Ok(Self {
            amount_before_discount,
            discount,
            amount,
        })
    }
}

/// An invoice being composed or edited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub payment_terms_days: u32,
    line_items: Vec<LineItem>,
}

impl InvoiceDraft {
    pub fn new(customer_id: CustomerId, date: NaiveDate, payment_terms_days: u32) -> Self {
        Self {
            customer_id,
            date,
            payment_terms_days,
            line_items: Vec::new(),
        }
    }

    /// Starts a draft using the customer's payment terms
    pub fn for_customer(customer: &Customer, date: NaiveDate) -> Self {
        Self::new(customer.id, date, customer.payment_terms_days())
    }

    /// Reopens a saved invoice for editing
    pub fn from_invoice(invoice: &Invoice, line_items: Vec<LineItem>) -> Self {
        let mut draft = Self::new(invoice.customer_id, invoice.date, invoice.payment_terms_days());
        let mut line_items = line_items;
        line_items.sort_by_key(|l| l.position);
        for item in line_items {
            draft.add_line(item);
        }
        draft
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn is_empty(&self) -> bool {
        self.line_items.is_empty()
    }

    /// Appends a line after the last position and returns its position
    pub fn add_line(&mut self, mut item: LineItem) -> u32 {
        let position = self.line_items.iter().map(|l| l.position).max().unwrap_or(0) + 1;
        item.position = position;
        self.line_items.push(item);
        position
    }

    /// Removes the line at `position`; the following lines move up by one
    pub fn remove_line(&mut self, position: u32) -> Option<LineItem> {
        let index = self.line_items.iter().position(|l| l.position == position)?;
        let removed = self.line_items.remove(index);
        for (i, item) in self.line_items.iter_mut().enumerate() {
            item.position = i as u32 + 1;
        }
        Some(removed)
    }

    pub fn totals(&self) -> Result<InvoiceTotals, BillingError> {
        InvoiceTotals::from_lines(&self.line_items)
    }

    pub fn due_date(&self) -> Result<NaiveDate, BillingError> {
        Ok(add_days(self.date, self.payment_terms_days)?)
    }

    /// Finalizes the draft into the record handed to the store
    ///
    /// # Errors
    ///
    /// Returns `BillingError::EmptyInvoice` if the draft has no lines and
    /// `BillingError::CalculationError` if the totals overflow.
    pub fn into_new_invoice(self) -> Result<NewInvoice, BillingError> {
        if self.line_items.is_empty() {
            return Err(BillingError::EmptyInvoice);
        }
        let due_date = self.due_date()?;
        let totals = self.totals()?;
        Ok(NewInvoice {
            customer_id: self.customer_id,
            date: self.date,
            due_date,
            totals,
            line_items: self.line_items,
        })
    }
}

/// A finalized invoice not yet persisted
///
/// The reference number and balance are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub totals: InvoiceTotals,
    pub line_items: Vec<LineItem>,
}

/// A stored invoice header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub ref_no: InvoiceNumber,
    pub customer_id: CustomerId,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(flatten)]
    pub totals: InvoiceTotals,
    /// Customer balance after this invoice
    pub balance: Money,
}

impl Invoice {
    pub fn amount(&self) -> Money {
        self.totals.amount
    }

    /// Days between issue date and due date
    pub fn payment_terms_days(&self) -> u32 {
        u32::try_from((self.due_date - self.date).num_days()).unwrap_or(0)
    }
}

/// An invoice together with its line items
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceWithLines {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub line_items: Vec<LineItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::ProductDetails;
    use rust_decimal_macros::dec;

    fn product() -> Product {
        Product::new(
            ProductId::new(1),
            ProductDetails {
                name: "Bread".to_string(),
                short_name: "BRD".to_string(),
                piece_suffix: "400g".to_string(),
                bulk_suffix: "kg".to_string(),
                piece_barcode: "8600000000011".to_string(),
                bulk_barcode: Some("2100001".to_string()),
                active: true,
                display_order: 1,
            },
        )
    }

    fn line(count: Decimal, price: Decimal, discount: Decimal) -> LineItem {
        let unit_price = UnitPrice::new(Money::new(price), Percentage::new(discount).unwrap());
        LineItem::new(&product(), Unit::Piece, count, unit_price).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_line_amounts() {
        let item = line(dec!(3), dec!(100), dec!(5));
        assert_eq!(item.amount_before_discount, Money::new(dec!(300)));
        assert_eq!(item.amount, Money::new(dec!(285)));
        assert_eq!(item.discount_amount(), Money::new(dec!(15)));
        assert_eq!(item.name, "Bread 400g");
    }

    #[test]
    fn test_line_amount_rounds_to_cents() {
        // 1.5 x 33.33 = 49.995, less 10% = 44.9955
        let item = line(dec!(1.5), dec!(33.33), dec!(10));
        assert_eq!(item.amount_before_discount.amount(), dec!(50.00));
        assert_eq!(item.amount.amount(), dec!(45.00));
    }

    #[test]
    fn test_bulk_line_uses_bulk_barcode() {
        let unit_price = UnitPrice::new(Money::new(dec!(80)), Percentage::zero());
        let item = LineItem::new(&product(), Unit::Bulk, dec!(2.35), unit_price).unwrap();
        assert_eq!(item.barcode.as_deref(), Some("2100001"));
        assert_eq!(item.name, "Bread kg");
        assert_eq!(item.amount, Money::new(dec!(188)));
    }

    #[test]
    fn test_non_positive_count_rejected() {
        let unit_price = UnitPrice::new(Money::new(dec!(80)), Percentage::zero());
        let err = LineItem::new(&product(), Unit::Piece, dec!(0), unit_price).unwrap_err();
        assert!(matches!(err, BillingError::InvalidLineItem(_)));
    }

    #[test]
    fn test_positions_stay_contiguous() {
        let mut draft = InvoiceDraft::new(CustomerId::new(1), date(2024, 1, 10), 30);
        assert_eq!(draft.add_line(line(dec!(1), dec!(10), dec!(0))), 1);
        assert_eq!(draft.add_line(line(dec!(2), dec!(10), dec!(0))), 2);
        assert_eq!(draft.add_line(line(dec!(3), dec!(10), dec!(0))), 3);

        let removed = draft.remove_line(2).unwrap();
        assert_eq!(removed.count, dec!(2));

        let positions: Vec<u32> = draft.line_items().iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(draft.line_items()[1].count, dec!(3));
        assert_eq!(draft.add_line(line(dec!(4), dec!(10), dec!(0))), 3);
        assert!(draft.remove_line(9).is_none());
    }

    #[test]
    fn test_totals_and_due_date() {
        let mut draft = InvoiceDraft::new(CustomerId::new(1), date(2024, 1, 10), 30);
        draft.add_line(line(dec!(3), dec!(100), dec!(5)));
        draft.add_line(line(dec!(1), dec!(50), dec!(0)));

        let invoice = draft.into_new_invoice().unwrap();
        assert_eq!(invoice.totals.amount_before_discount, Money::new(dec!(350)));
        assert_eq!(invoice.totals.amount, Money::new(dec!(335)));
        assert_eq!(invoice.totals.discount, Money::new(dec!(15)));
        assert_eq!(invoice.due_date, date(2024, 2, 9));
    }

    #[test]
    fn test_totals_overflow_is_a_calculation_error() {
        let mut draft = InvoiceDraft::new(CustomerId::new(1), date(2024, 1, 10), 30);
        draft.add_line(line(dec!(1), dec!(40000000000000000000000000000), dec!(0)));
        draft.add_line(line(dec!(1), dec!(40000000000000000000000000000), dec!(0)));

        assert!(matches!(draft.totals(), Err(BillingError::CalculationError(_))));
        assert!(matches!(draft.into_new_invoice(), Err(BillingError::CalculationError(_))));
    }

    #[test]
    fn test_empty_draft_cannot_be_finalized() {
        let draft = InvoiceDraft::new(CustomerId::new(1), date(2024, 1, 10), 30);
        assert!(matches!(draft.into_new_invoice(), Err(BillingError::EmptyInvoice)));
    }

    #[test]
    fn test_reopened_invoice_keeps_terms_and_order() {
        let invoice = Invoice {
            id: InvoiceId::new(4),
            ref_no: InvoiceNumber::new(4, 24).unwrap(),
            customer_id: CustomerId::new(1),
            date: date(2024, 3, 1),
            due_date: date(2024, 3, 16),
            totals: InvoiceTotals::default(),
            balance: Money::zero(),
        };
        let mut second = line(dec!(2), dec!(10), dec!(0));
        second.position = 2;
        let mut first = line(dec!(1), dec!(10), dec!(0));
        first.position = 1;

        let draft = InvoiceDraft::from_invoice(&invoice, vec![second, first]);
        assert_eq!(draft.payment_terms_days, 15);
        assert_eq!(draft.line_items()[0].count, dec!(1));
        assert_eq!(draft.line_items()[1].position, 2);
    }
}
