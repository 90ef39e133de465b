//! Custom Test Assertions
//!
//! Assertion helpers for balances that give more meaningful failure
//! messages than `assert_eq!` on whole structs.

use rust_decimal::Decimal;

use core_kernel::Money;
use domain_billing::{sort_chronologically, LedgerEntry};

/// Asserts that a Money value equals a decimal amount
pub fn assert_money_eq(actual: Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that every stored balance equals the running sum of the history
/// up to and including that entry, in processing order
///
/// Returns the final balance.
///
/// # Panics
///
/// Panics naming the first entry whose stored balance is wrong
pub fn assert_balances_consistent(entries: &[LedgerEntry]) -> Money {
    let mut ordered = entries.to_vec();
    sort_chronologically(&mut ordered);

    let mut running = Money::zero();
    for entry in &ordered {
        running = running + entry.signed_amount();
        assert_eq!(
            entry.balance, running,
            "Stored balance of {} on {} is {}, expected {}",
            entry.entry, entry.date, entry.balance, running
        );
    }
    running
}

/// Asserts that the final balance equals invoices minus payments
pub fn assert_final_balance(entries: &[LedgerEntry], final_balance: Money) {
    let expected: Money = entries.iter().map(LedgerEntry::signed_amount).sum();
    assert_eq!(
        final_balance, expected,
        "Final balance {} does not match invoices minus payments {}",
        final_balance, expected
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{InvoiceId, PaymentId};
    use rust_decimal_macros::dec;

    use crate::fixtures::date;

    #[test]
    fn test_consistent_history_passes() {
        let entries = vec![
            LedgerEntry::invoice(InvoiceId::new(1), date(2024, 1, 1), Money::new(dec!(100)), Money::new(dec!(100))),
            LedgerEntry::payment(PaymentId::new(2), date(2024, 1, 5), Money::new(dec!(30)), Money::new(dec!(70))),
        ];
        let balance = assert_balances_consistent(&entries);
        assert_money_eq(balance, dec!(70));
        assert_final_balance(&entries, balance);
    }

    #[test]
    #[should_panic(expected = "Stored balance")]
    fn test_stale_balance_panics() {
        let entries = vec![LedgerEntry::invoice(
            InvoiceId::new(1),
            date(2024, 1, 1),
            Money::new(dec!(100)),
            Money::zero(),
        )];
        assert_balances_consistent(&entries);
    }
}
