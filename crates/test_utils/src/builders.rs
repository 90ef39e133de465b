//! Test Data Builders
//!
//! Builder patterns for constructing test data with sensible defaults.
//! Tests specify only the fields that matter to them.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{add_days, CustomerId, InvoiceId, Money, PaymentId};
use domain_billing::{
    Invoice, InvoiceDraft, InvoiceNumber, InvoiceTotals, LedgerEntry, LineItem, Payment, Product,
    Unit, UnitPrice, DEFAULT_PAYMENT_TERMS_DAYS,
};

use crate::fixtures::{DateFixtures, IdFixtures};

/// Builder for stored invoices, used to seed stores directly
pub struct InvoiceBuilder {
    id: InvoiceId,
    ref_no: Option<InvoiceNumber>,
    customer_id: CustomerId,
    date: NaiveDate,
    amount: Money,
    balance: Money,
}

impl InvoiceBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id: InvoiceId::new(id),
            ref_no: None,
            customer_id: IdFixtures::customer(),
            date: DateFixtures::today(),
            amount: Money::zero(),
            balance: Money::zero(),
        }
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Money::new(amount);
        self
    }

    /// Sets the stored running balance
    pub fn balance(mut self, balance: Decimal) -> Self {
        self.balance = Money::new(balance);
        self
    }

    pub fn ref_no(mut self, ref_no: InvoiceNumber) -> Self {
        self.ref_no = Some(ref_no);
        self
    }

    pub fn build(self) -> Invoice {
        let ref_no = self.ref_no.unwrap_or_else(|| {
            let sequence = u32::try_from(self.id.get()).unwrap_or(1).max(1);
            InvoiceNumber::new(sequence, 24).unwrap_or_else(|e| panic!("bad fixture number: {e}"))
        });
        let due_date = add_days(self.date, DEFAULT_PAYMENT_TERMS_DAYS)
            .unwrap_or_else(|e| panic!("bad fixture date: {e}"));

        Invoice {
            id: self.id,
            ref_no,
            customer_id: self.customer_id,
            date: self.date,
            due_date,
            totals: InvoiceTotals {
                amount_before_discount: self.amount,
                discount: Money::zero(),
                amount: self.amount,
            },
            balance: self.balance,
        }
    }
}

/// Builder for stored payments
pub struct PaymentBuilder {
    id: PaymentId,
    customer_id: CustomerId,
    invoice_id: Option<InvoiceId>,
    date: NaiveDate,
    amount: Money,
    balance: Money,
}

impl PaymentBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            id: PaymentId::new(id),
            customer_id: IdFixtures::customer(),
            invoice_id: None,
            date: DateFixtures::today(),
            amount: Money::zero(),
            balance: Money::zero(),
        }
    }

    pub fn customer(mut self, customer_id: CustomerId) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn settling(mut self, invoice_id: InvoiceId) -> Self {
        self.invoice_id = Some(invoice_id);
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Money::new(amount);
        self
    }

    pub fn balance(mut self, balance: Decimal) -> Self {
        self.balance = Money::new(balance);
        self
    }

    pub fn build(self) -> Payment {
        Payment {
            id: self.id,
            customer_id: self.customer_id,
            invoice_id: self.invoice_id,
            date: self.date,
            amount: self.amount,
            balance: self.balance,
        }
    }
}

/// Builds a customer's transaction history with zero stored balances
///
/// Ids are assigned in call order starting at 1, shared between invoices
/// and payments.
#[derive(Default)]
pub struct LedgerHistoryBuilder {
    entries: Vec<LedgerEntry>,
}

impl LedgerHistoryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.entries.len() as i64 + 1
    }

    pub fn invoice(mut self, date: NaiveDate, amount: Decimal) -> Self {
        let id = InvoiceId::new(self.next_id());
        self.entries
            .push(LedgerEntry::invoice(id, date, Money::new(amount), Money::zero()));
        self
    }

    pub fn payment(mut self, date: NaiveDate, amount: Decimal) -> Self {
        let id = PaymentId::new(self.next_id());
        self.entries
            .push(LedgerEntry::payment(id, date, Money::new(amount), Money::zero()));
        self
    }

    pub fn build(self) -> Vec<LedgerEntry> {
        self.entries
    }
}

/// Builder for invoice drafts from products and unit prices
pub struct InvoiceDraftBuilder {
    draft: InvoiceDraft,
}

impl InvoiceDraftBuilder {
    pub fn new(customer_id: CustomerId, date: NaiveDate) -> Self {
        Self {
            draft: InvoiceDraft::new(customer_id, date, DEFAULT_PAYMENT_TERMS_DAYS),
        }
    }

    pub fn terms(mut self, days: u32) -> Self {
        self.draft.payment_terms_days = days;
        self
    }

    /// Adds a line, panicking if the line is invalid
    pub fn line(mut self, product: &Product, unit: Unit, count: Decimal, price: UnitPrice) -> Self {
        let item = LineItem::new(product, unit, count, price)
            .unwrap_or_else(|e| panic!("invalid fixture line: {e}"));
        self.draft.add_line(item);
        self
    }

    pub fn build(self) -> InvoiceDraft {
        self.draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::date;
    use rust_decimal_macros::dec;

    #[test]
    fn test_invoice_builder_defaults() {
        let invoice = InvoiceBuilder::new(3).amount(dec!(50)).build();
        assert_eq!(invoice.ref_no.to_string(), "3/24");
        assert_eq!(invoice.amount(), Money::new(dec!(50)));
        assert_eq!(invoice.due_date, date(2024, 5, 31));
    }

    #[test]
    fn test_history_ids_are_sequential() {
        let history = LedgerHistoryBuilder::new()
            .invoice(date(2024, 1, 1), dec!(10))
            .payment(date(2024, 1, 2), dec!(5))
            .build();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].entry.to_string(), "PAY-2");
    }
}
