//! Customer repository

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

const CUSTOMER_COLUMNS: &str = "id, name, address, tax_id, registration_no, bank_account, \
     payment_terms_days, delivery_name, delivery_street, delivery_city, active, balance";

/// Repository for the `customers` table
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: PgPool,
}

impl CustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists all customers by id
    pub async fn list(&self) -> Result<Vec<CustomerRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<CustomerRow, DatabaseError> {
        sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Customer", id))
    }

    pub async fn insert(&self, customer: NewCustomer) -> Result<CustomerRow, DatabaseError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            INSERT INTO customers (
                name, address, tax_id, registration_no, bank_account,
                payment_terms_days, delivery_name, delivery_street, delivery_city, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(customer.name)
        .bind(customer.address)
        .bind(customer.tax_id)
        .bind(customer.registration_no)
        .bind(customer.bank_account)
        .bind(customer.payment_terms_days)
        .bind(customer.delivery_name)
        .bind(customer.delivery_street)
        .bind(customer.delivery_city)
        .bind(customer.active)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Updates every editable column; the balance is left untouched
    pub async fn update(&self, id: i64, customer: NewCustomer) -> Result<CustomerRow, DatabaseError> {
        sqlx::query_as::<_, CustomerRow>(&format!(
            r#"
            UPDATE customers SET
                name = $2, address = $3, tax_id = $4, registration_no = $5,
                bank_account = $6, payment_terms_days = $7, delivery_name = $8,
                delivery_street = $9, delivery_city = $10, active = $11
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(customer.name)
        .bind(customer.address)
        .bind(customer.tax_id)
        .bind(customer.registration_no)
        .bind(customer.bank_account)
        .bind(customer.payment_terms_days)
        .bind(customer.delivery_name)
        .bind(customer.delivery_street)
        .bind(customer.delivery_city)
        .bind(customer.active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Customer", id))
    }

    pub async fn balance(&self, id: i64) -> Result<Decimal, DatabaseError> {
        sqlx::query_scalar::<_, Decimal>("SELECT balance FROM customers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Customer", id))
    }

    pub async fn update_balance(&self, id: i64, balance: Decimal) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE customers SET balance = $2 WHERE id = $1")
            .bind(id)
            .bind(balance)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Customer", id));
        }
        Ok(())
    }
}

/// Database row for a customer
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CustomerRow {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub tax_id: String,
    pub registration_no: String,
    pub bank_account: String,
    pub payment_terms_days: i32,
    pub delivery_name: String,
    pub delivery_street: String,
    pub delivery_city: Option<String>,
    pub active: bool,
    pub balance: Decimal,
}

/// Editable customer columns
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub address: String,
    pub tax_id: String,
    pub registration_no: String,
    pub bank_account: String,
    pub payment_terms_days: i32,
    pub delivery_name: String,
    pub delivery_street: String,
    pub delivery_city: Option<String>,
    pub active: bool,
}
