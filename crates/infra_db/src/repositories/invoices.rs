//! Invoice repository
//!
//! Invoice headers live in `invoices`, their positions in `line_items`.
//! Reference numbers are assigned inside the insert transaction while a
//! transaction-scoped advisory lock is held, so concurrent inserts never
//! read the same "latest invoice".

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::error::DatabaseError;

/// Advisory lock key serializing reference-number assignment
pub const INVOICE_NUMBER_LOCK_KEY: i64 = 0x494E_564F_4943;

const INVOICE_COLUMNS: &str = "id, ref_no, customer_id, date, due_date, \
     amount_before_discount, discount, amount, balance";

const LINE_ITEM_COLUMNS: &str = "invoice_id, position, product_id, name, barcode, unit, \
     count, price, discount, amount_before_discount, amount";

/// Repository for invoices and their line items
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists invoice headers, newest first
    pub async fn list(&self) -> Result<Vec<InvoiceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<InvoiceRow, DatabaseError> {
        sqlx::query_as::<_, InvoiceRow>(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))
    }

    /// Returns the line items of an invoice by position
    pub async fn line_items(&self, invoice_id: i64) -> Result<Vec<LineItemRow>, DatabaseError> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM invoices WHERE id = $1)")
            .bind(invoice_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(DatabaseError::not_found("Invoice", invoice_id));
        }

        let rows = sqlx::query_as::<_, LineItemRow>(&format!(
            "SELECT {LINE_ITEM_COLUMNS} FROM line_items WHERE invoice_id = $1 ORDER BY position"
        ))
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Returns the date and reference number of the invoice with the highest id
    pub async fn latest(&self) -> Result<Option<LatestInvoiceRow>, DatabaseError> {
        let row = sqlx::query_as::<_, LatestInvoiceRow>(
            "SELECT date, ref_no FROM invoices ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Inserts an invoice with its line items, numbering it atomically
    ///
    /// `assign_ref_no` receives the latest invoice as seen under the
    /// numbering lock and returns the reference number for the new one.
    pub async fn insert_numbered<F>(
        &self,
        invoice: NewInvoice,
        line_items: Vec<NewLineItem>,
        assign_ref_no: F,
    ) -> Result<InvoiceRow, DatabaseError>
    where
        F: FnOnce(Option<LatestInvoiceRow>) -> Result<String, DatabaseError> + Send,
    {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(INVOICE_NUMBER_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let latest = sqlx::query_as::<_, LatestInvoiceRow>(
            "SELECT date, ref_no FROM invoices ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&mut *tx)
        .await?;
        let ref_no = assign_ref_no(latest)?;
        debug!(%ref_no, "Assigned invoice reference number");

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            INSERT INTO invoices (
                ref_no, customer_id, date, due_date, amount_before_discount, discount, amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(&ref_no)
        .bind(invoice.customer_id)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(invoice.amount_before_discount)
        .bind(invoice.discount)
        .bind(invoice.amount)
        .fetch_one(&mut *tx)
        .await?;

        insert_line_items(&mut tx, row.id, &line_items).await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Replaces the header fields and line items of an invoice
    ///
    /// The reference number and balance are kept.
    pub async fn update(
        &self,
        id: i64,
        invoice: NewInvoice,
        line_items: Vec<NewLineItem>,
    ) -> Result<InvoiceRow, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            r#"
            UPDATE invoices SET
                customer_id = $2, date = $3, due_date = $4,
                amount_before_discount = $5, discount = $6, amount = $7
            WHERE id = $1
            RETURNING {INVOICE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(invoice.customer_id)
        .bind(invoice.date)
        .bind(invoice.due_date)
        .bind(invoice.amount_before_discount)
        .bind(invoice.discount)
        .bind(invoice.amount)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Invoice", id))?;

        sqlx::query("DELETE FROM line_items WHERE invoice_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_line_items(&mut tx, id, &line_items).await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn update_balance(&self, id: i64, balance: Decimal) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE invoices SET balance = $2 WHERE id = $1")
            .bind(id)
            .bind(balance)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Invoice", id));
        }
        Ok(())
    }
}

async fn insert_line_items(
    tx: &mut Transaction<'_, Postgres>,
    invoice_id: i64,
    line_items: &[NewLineItem],
) -> Result<(), DatabaseError> {
    for item in line_items {
        sqlx::query(
            r#"
            INSERT INTO line_items (
                invoice_id, position, product_id, name, barcode, unit,
                count, price, discount, amount_before_discount, amount
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(invoice_id)
        .bind(item.position)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(&item.barcode)
        .bind(item.unit)
        .bind(item.count)
        .bind(item.price)
        .bind(item.discount)
        .bind(item.amount_before_discount)
        .bind(item.amount)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// Unit a line item was sold in
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "sale_unit", rename_all = "snake_case")]
pub enum SaleUnit {
    Piece,
    Bulk,
}

/// Database row for an invoice header
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InvoiceRow {
    pub id: i64,
    pub ref_no: String,
    pub customer_id: i64,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount_before_discount: Decimal,
    pub discount: Decimal,
    pub amount: Decimal,
    pub balance: Decimal,
}

/// Date and reference number of the latest invoice
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LatestInvoiceRow {
    pub date: NaiveDate,
    pub ref_no: String,
}

/// Database row for a line item
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LineItemRow {
    pub invoice_id: i64,
    pub position: i32,
    pub product_id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub unit: SaleUnit,
    pub count: Decimal,
    pub price: Decimal,
    pub discount: Decimal,
    pub amount_before_discount: Decimal,
    pub amount: Decimal,
}

/// Invoice header columns written on insert and update
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub customer_id: i64,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    pub amount_before_discount: Decimal,
    pub discount: Decimal,
    pub amount: Decimal,
}

/// Line item columns written on insert and update
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub position: i32,
    pub product_id: i64,
    pub name: String,
    pub barcode: Option<String>,
    pub unit: SaleUnit,
    pub count: Decimal,
    pub price: Decimal,
    pub discount: Decimal,
    pub amount_before_discount: Decimal,
    pub amount: Decimal,
}
