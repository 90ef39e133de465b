//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::{InvoiceId, Money, PaymentId, Percentage};
use domain_billing::{InvoiceNumber, LedgerEntry};

/// Strategy for generating positive amounts in minor units (up to 1,000,000.00)
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Strategy for generating positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(Money::from_minor)
}

/// Strategy for generating Money values of either sign
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (-100_000_000i64..100_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for generating discounts with two decimal places (0% to 100%)
pub fn percentage_strategy() -> impl Strategy<Value = Percentage> {
    (0i64..=10_000i64).prop_map(|n| {
        Percentage::new(Decimal::new(n, 2)).unwrap_or_else(|e| panic!("generated {n}: {e}"))
    })
}

/// Strategy for generating dates within 2023-2025
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0u64..1095u64).prop_map(|days| {
        NaiveDate::from_ymd_opt(2023, 1, 1)
            .and_then(|start| start.checked_add_days(Days::new(days)))
            .unwrap_or_else(|| panic!("generated day offset {days} out of range"))
    })
}

/// Strategy for generating valid invoice numbers
pub fn invoice_number_strategy() -> impl Strategy<Value = InvoiceNumber> {
    (1u32..100_000u32, 0u8..100u8).prop_map(|(sequence, year)| {
        InvoiceNumber::new(sequence, year).unwrap_or_else(|e| panic!("generated number: {e}"))
    })
}

/// Strategy for generating a customer's transaction history
///
/// Every entry gets a unique id and an arbitrary stale stored balance.
/// Dates are drawn from a narrow window so same-day ties are common.
pub fn ledger_history_strategy(max_len: usize) -> impl Strategy<Value = Vec<LedgerEntry>> {
    proptest::collection::vec(
        (any::<bool>(), 0u64..20u64, positive_money_strategy(), money_strategy()),
        0..=max_len,
    )
    .prop_map(|rows| {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
        rows.into_iter()
            .enumerate()
            .map(|(index, (is_invoice, offset, amount, stale))| {
                let id = index as i64 + 1;
                let date = start
                    .checked_add_days(Days::new(offset))
                    .unwrap_or(start);
                if is_invoice {
                    LedgerEntry::invoice(InvoiceId::new(id), date, amount, stale)
                } else {
                    LedgerEntry::payment(PaymentId::new(id), date, amount, stale)
                }
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #[test]
        fn positive_money_is_always_positive(money in positive_money_strategy()) {
            prop_assert!(money.is_positive());
        }

        #[test]
        fn invoice_numbers_parse_back(number in invoice_number_strategy()) {
            let parsed: InvoiceNumber = number.to_string().parse().unwrap();
            prop_assert_eq!(parsed, number);
        }

        #[test]
        fn history_ids_are_unique(history in ledger_history_strategy(30)) {
            let ids: HashSet<String> = history.iter().map(|e| e.entry.to_string()).collect();
            prop_assert_eq!(ids.len(), history.len());
        }
    }
}
