//! Payment repository

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

const PAYMENT_COLUMNS: &str = "id, customer_id, invoice_id, date, amount, balance";

/// Repository for the `payments` table
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists payments, newest first
    pub async fn list(&self) -> Result<Vec<PaymentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<PaymentRow, DatabaseError> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Payment", id))
    }

    pub async fn insert(&self, payment: NewPayment) -> Result<PaymentRow, DatabaseError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            INSERT INTO payments (customer_id, invoice_id, date, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment.customer_id)
        .bind(payment.invoice_id)
        .bind(payment.date)
        .bind(payment.amount)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, payment: NewPayment) -> Result<PaymentRow, DatabaseError> {
        sqlx::query_as::<_, PaymentRow>(&format!(
            r#"
            UPDATE payments SET customer_id = $2, invoice_id = $3, date = $4, amount = $5
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(payment.customer_id)
        .bind(payment.invoice_id)
        .bind(payment.date)
        .bind(payment.amount)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Payment", id))
    }

    pub async fn update_balance(&self, id: i64, balance: Decimal) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE payments SET balance = $2 WHERE id = $1")
            .bind(id)
            .bind(balance)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Payment", id));
        }
        Ok(())
    }
}

/// Database row for a payment
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRow {
    pub id: i64,
    pub customer_id: i64,
    pub invoice_id: Option<i64>,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub balance: Decimal,
}

/// Payment columns written on insert and update
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub customer_id: i64,
    pub invoice_id: Option<i64>,
    pub date: NaiveDate,
    pub amount: Decimal,
}
