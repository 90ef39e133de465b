//! Ledger entry model
//!
//! Invoices and payments are the two kinds of transactions that move a
//! customer's balance. The reconciliation engine sees both through the
//! uniform [`LedgerEntry`] shape.
//!
//! # Ordering
//!
//! Entries are ordered by date. On the same date payments come before
//! invoices, so a payment clears earlier debt before the new invoice is
//! added. Entries of the same kind on the same date keep creation order (id).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{InvoiceId, Money, PaymentId};

use crate::invoice::Invoice;
use crate::payment::Payment;

/// Kind of a ledger entry
///
/// Variant order is the same-day processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Payment,
    Invoice,
}

/// Identity of the record behind a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntryRef {
    Invoice(InvoiceId),
    Payment(PaymentId),
}

impl EntryRef {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryRef::Invoice(_) => EntryKind::Invoice,
            EntryRef::Payment(_) => EntryKind::Payment,
        }
    }

    fn raw_id(&self) -> i64 {
        match self {
            EntryRef::Invoice(id) => id.get(),
            EntryRef::Payment(id) => id.get(),
        }
    }
}

impl std::fmt::Display for EntryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryRef::Invoice(id) => write!(f, "{id}"),
            EntryRef::Payment(id) => write!(f, "{id}"),
        }
    }
}

/// An invoice or payment as seen by the reconciliation engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry: EntryRef,
    pub date: NaiveDate,
    /// Unsigned amount as stored on the record
    pub amount: Money,
    /// Stored running balance after this entry
    pub balance: Money,
}

impl LedgerEntry {
    pub fn invoice(id: InvoiceId, date: NaiveDate, amount: Money, balance: Money) -> Self {
        Self {
            entry: EntryRef::Invoice(id),
            date,
            amount,
            balance,
        }
    }

    pub fn payment(id: PaymentId, date: NaiveDate, amount: Money, balance: Money) -> Self {
        Self {
            entry: EntryRef::Payment(id),
            date,
            amount,
            balance,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.entry.kind()
    }

    /// Effect on the customer's balance: invoices add, payments subtract
    pub fn signed_amount(&self) -> Money {
        match self.kind() {
            EntryKind::Invoice => self.amount,
            EntryKind::Payment => -self.amount,
        }
    }

    /// Key giving the processing order
    pub fn sort_key(&self) -> (NaiveDate, EntryKind, i64) {
        (self.date, self.kind(), self.entry.raw_id())
    }
}

impl From<&Invoice> for LedgerEntry {
    fn from(invoice: &Invoice) -> Self {
        LedgerEntry::invoice(invoice.id, invoice.date, invoice.amount(), invoice.balance)
    }
}

impl From<&Payment> for LedgerEntry {
    fn from(payment: &Payment) -> Self {
        LedgerEntry::payment(payment.id, payment.date, payment.amount, payment.balance)
    }
}

/// Sorts entries into processing order
pub fn sort_chronologically(entries: &mut [LedgerEntry]) {
    entries.sort_by_key(LedgerEntry::sort_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn test_payment_sorts_before_invoice_on_same_day() {
        let mut entries = vec![
            LedgerEntry::invoice(InvoiceId::new(1), date(10), Money::new(dec!(100)), Money::zero()),
            LedgerEntry::payment(PaymentId::new(9), date(10), Money::new(dec!(40)), Money::zero()),
        ];
        sort_chronologically(&mut entries);
        assert_eq!(entries[0].kind(), EntryKind::Payment);
        assert_eq!(entries[1].kind(), EntryKind::Invoice);
    }

    #[test]
    fn test_date_dominates_kind() {
        let mut entries = vec![
            LedgerEntry::payment(PaymentId::new(1), date(11), Money::new(dec!(40)), Money::zero()),
            LedgerEntry::invoice(InvoiceId::new(2), date(10), Money::new(dec!(100)), Money::zero()),
        ];
        sort_chronologically(&mut entries);
        assert_eq!(entries[0].entry, EntryRef::Invoice(InvoiceId::new(2)));
    }

    #[test]
    fn test_same_kind_same_day_keeps_creation_order() {
        let mut entries = vec![
            LedgerEntry::invoice(InvoiceId::new(8), date(10), Money::new(dec!(1)), Money::zero()),
            LedgerEntry::invoice(InvoiceId::new(3), date(10), Money::new(dec!(2)), Money::zero()),
        ];
        sort_chronologically(&mut entries);
        assert_eq!(entries[0].entry, EntryRef::Invoice(InvoiceId::new(3)));
    }

    #[test]
    fn test_signed_amount() {
        let payment = LedgerEntry::payment(PaymentId::new(1), date(1), Money::new(dec!(40)), Money::zero());
        assert_eq!(payment.signed_amount(), Money::new(dec!(-40)));
    }
}
