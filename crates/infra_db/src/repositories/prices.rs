//! Price-list repository

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::error::DatabaseError;

/// Repository for the `prices` table
#[derive(Debug, Clone)]
pub struct PriceRepository {
    pool: PgPool,
}

impl PriceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_customer(&self, customer_id: i64) -> Result<Vec<PriceRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PriceRow>(
            r#"
            SELECT customer_id, product_id, piece_price, piece_discount, bulk_price, bulk_discount
            FROM prices
            WHERE customer_id = $1
            ORDER BY product_id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts or replaces entries keyed by (customer, product) in one transaction
    pub async fn upsert(&self, prices: &[PriceRow]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        for price in prices {
            sqlx::query(
                r#"
                INSERT INTO prices (
                    customer_id, product_id, piece_price, piece_discount, bulk_price, bulk_discount
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (customer_id, product_id) DO UPDATE SET
                    piece_price = EXCLUDED.piece_price,
                    piece_discount = EXCLUDED.piece_discount,
                    bulk_price = EXCLUDED.bulk_price,
                    bulk_discount = EXCLUDED.bulk_discount
                "#,
            )
            .bind(price.customer_id)
            .bind(price.product_id)
            .bind(price.piece_price)
            .bind(price.piece_discount)
            .bind(price.bulk_price)
            .bind(price.bulk_discount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Database row for a price-list entry
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PriceRow {
    pub customer_id: i64,
    pub product_id: i64,
    pub piece_price: Decimal,
    pub piece_discount: Decimal,
    pub bulk_price: Decimal,
    pub bulk_discount: Decimal,
}
