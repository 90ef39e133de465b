//! Balance reconciliation
//!
//! Running balances are stored on every invoice, every payment and on the
//! customer. They are derived data: this module is their only writer.
//!
//! Reconciliation reads all of a customer's transactions from the store,
//! walks them in chronological order (payments before invoices on the same
//! day) and writes back only the balances that differ from what is stored.
//! The customer's balance is written last.
//!
//! # Failure behaviour
//!
//! Writes are issued one at a time and are not atomic as a group. When a
//! write fails the error is returned and earlier writes stay applied.
//! Running the reconciliation again is safe: entries that already hold the
//! correct balance are not written.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use core_kernel::{CustomerId, Money};

use crate::error::BillingError;
use crate::ledger::{sort_chronologically, EntryRef, LedgerEntry};
use crate::ports::LedgerPort;

/// A balance that must be rewritten
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub entry: EntryRef,
    pub stored: Money,
    pub computed: Money,
}

/// Balance writes needed to bring a customer's transactions up to date
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconciliationPlan {
    /// Updates in processing order
    pub updates: Vec<BalanceUpdate>,
    /// Balance after the last transaction
    pub final_balance: Money,
    /// Number of transactions examined
    pub entries: usize,
}

impl ReconciliationPlan {
    pub fn is_clean(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Computes the running balances of a customer's transactions
///
/// Pure: performs no I/O. The entries may be given in any order.
///
/// # Errors
///
/// Returns `BillingError::Money` if the running balance overflows.
pub fn plan_reconciliation(mut entries: Vec<LedgerEntry>) -> Result<ReconciliationPlan, BillingError> {
    sort_chronologically(&mut entries);

    let mut balance = Money::zero();
    let mut updates = Vec::new();

    for entry in &entries {
        balance = balance.checked_add(&entry.signed_amount())?;
        if balance != entry.balance {
            updates.push(BalanceUpdate {
                entry: entry.entry,
                stored: entry.balance,
                computed: balance,
            });
        }
    }

    Ok(ReconciliationPlan {
        updates,
        final_balance: balance,
        entries: entries.len(),
    })
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub customer_id: CustomerId,
    pub entries_examined: usize,
    pub entries_updated: usize,
    pub customer_balance_updated: bool,
    pub final_balance: Money,
}

impl ReconciliationReport {
    /// Total number of records written
    pub fn writes(&self) -> usize {
        self.entries_updated + usize::from(self.customer_balance_updated)
    }
}

/// Recomputes and persists the running balances of one customer
pub struct BalanceReconciler<P: ?Sized> {
    port: Arc<P>,
}

impl<P: ?Sized> Clone for BalanceReconciler<P> {
    fn clone(&self) -> Self {
        Self {
            port: Arc::clone(&self.port),
        }
    }
}

impl<P: LedgerPort + ?Sized> BalanceReconciler<P> {
    pub fn new(port: Arc<P>) -> Self {
        Self { port }
    }

    /// Brings every stored balance of the customer in line with its
    /// transaction history
    ///
    /// Reads are always made against the store, never a cache. Writes are
    /// sequential, in processing order, and the customer write comes last.
    /// The customer's balance is only written when it changed.
    #[instrument(skip(self))]
    pub async fn reconcile(&self, customer_id: CustomerId) -> Result<ReconciliationReport, BillingError> {
        let entries = self.port.transactions_for_customer(customer_id).await?;
        let plan = plan_reconciliation(entries)?;

        for update in &plan.updates {
            debug!(
                entry = %update.entry,
                stored = %update.stored,
                computed = %update.computed,
                "Rewriting running balance"
            );
            match update.entry {
                EntryRef::Invoice(id) => self.port.update_invoice_balance(id, update.computed).await?,
                EntryRef::Payment(id) => self.port.update_payment_balance(id, update.computed).await?,
            }
        }

        let stored_balance = self.port.customer_balance(customer_id).await?;
        let customer_balance_updated = stored_balance != plan.final_balance;
        if customer_balance_updated {
            self.port
                .update_customer_balance(customer_id, plan.final_balance)
                .await?;
        }

        let report = ReconciliationReport {
            customer_id,
            entries_examined: plan.entries,
            entries_updated: plan.updates.len(),
            customer_balance_updated,
            final_balance: plan.final_balance,
        };

        info!(
            entries = report.entries_examined,
            updated = report.entries_updated,
            customer_updated = report.customer_balance_updated,
            balance = %report.final_balance,
            "Reconciled customer balance"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_kernel::{InvoiceId, PaymentId};
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn money(amount: rust_decimal::Decimal) -> Money {
        Money::new(amount)
    }

    #[test]
    fn test_same_day_payment_applied_first() {
        let entries = vec![
            LedgerEntry::invoice(InvoiceId::new(1), date(10), money(dec!(100)), Money::zero()),
            LedgerEntry::payment(PaymentId::new(2), date(10), money(dec!(40)), Money::zero()),
        ];

        let plan = plan_reconciliation(entries).unwrap();

        assert_eq!(plan.final_balance, money(dec!(60)));
        assert_eq!(
            plan.updates,
            vec![
                BalanceUpdate {
                    entry: EntryRef::Payment(PaymentId::new(2)),
                    stored: Money::zero(),
                    computed: money(dec!(-40)),
                },
                BalanceUpdate {
                    entry: EntryRef::Invoice(InvoiceId::new(1)),
                    stored: Money::zero(),
                    computed: money(dec!(60)),
                },
            ]
        );
    }

    #[test]
    fn test_only_differing_balances_are_planned() {
        let entries = vec![
            LedgerEntry::invoice(InvoiceId::new(1), date(1), money(dec!(100)), money(dec!(100))),
            LedgerEntry::payment(PaymentId::new(2), date(5), money(dec!(30)), money(dec!(999))),
            LedgerEntry::invoice(InvoiceId::new(3), date(9), money(dec!(20)), money(dec!(90))),
        ];

        let plan = plan_reconciliation(entries).unwrap();

        assert_eq!(plan.entries, 3);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].entry, EntryRef::Payment(PaymentId::new(2)));
        assert_eq!(plan.updates[0].computed, money(dec!(70)));
        assert_eq!(plan.final_balance, money(dec!(90)));
    }

    #[test]
    fn test_empty_history() {
        let plan = plan_reconciliation(Vec::new()).unwrap();
        assert!(plan.is_clean());
        assert_eq!(plan.final_balance, Money::zero());
    }

    #[test]
    fn test_overpayment_goes_negative() {
        let entries = vec![
            LedgerEntry::invoice(InvoiceId::new(1), date(1), money(dec!(50)), Money::zero()),
            LedgerEntry::payment(PaymentId::new(2), date(2), money(dec!(80)), Money::zero()),
        ];
        let plan = plan_reconciliation(entries).unwrap();
        assert_eq!(plan.final_balance, money(dec!(-30)));
    }
}
