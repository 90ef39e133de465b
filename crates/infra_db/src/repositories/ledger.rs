//! Ledger reads across invoices and payments

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

/// Read-only view of a customer's invoices and payments
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns every invoice and payment of a customer in one query
    pub async fn transactions_for_customer(
        &self,
        customer_id: i64,
    ) -> Result<Vec<LedgerRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, LedgerRow>(
            r#"
            SELECT 'invoice' AS kind, id, date, amount, balance
            FROM invoices
            WHERE customer_id = $1
            UNION ALL
            SELECT 'payment' AS kind, id, date, amount, balance
            FROM payments
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// One invoice or payment as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRow {
    pub kind: String,
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub balance: Decimal,
}
