//! Product repository

use sqlx::PgPool;

use crate::error::DatabaseError;

const PRODUCT_COLUMNS: &str = "id, name, short_name, piece_suffix, bulk_suffix, \
     piece_barcode, bulk_barcode, active, display_order";

/// Repository for the `products` table
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: PgPool,
}

impl ProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists all products, active or not, by display order
    pub async fn list(&self) -> Result<Vec<ProductRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY display_order, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<ProductRow, DatabaseError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Product", id))
    }

    pub async fn insert(&self, product: NewProduct) -> Result<ProductRow, DatabaseError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (
                name, short_name, piece_suffix, bulk_suffix,
                piece_barcode, bulk_barcode, active, display_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(product.name)
        .bind(product.short_name)
        .bind(product.piece_suffix)
        .bind(product.bulk_suffix)
        .bind(product.piece_barcode)
        .bind(product.bulk_barcode)
        .bind(product.active)
        .bind(product.display_order)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, product: NewProduct) -> Result<ProductRow, DatabaseError> {
        sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products SET
                name = $2, short_name = $3, piece_suffix = $4, bulk_suffix = $5,
                piece_barcode = $6, bulk_barcode = $7, active = $8, display_order = $9
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(product.name)
        .bind(product.short_name)
        .bind(product.piece_suffix)
        .bind(product.bulk_suffix)
        .bind(product.piece_barcode)
        .bind(product.bulk_barcode)
        .bind(product.active)
        .bind(product.display_order)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Product", id))
    }
}

/// Database row for a product
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub piece_suffix: String,
    pub bulk_suffix: String,
    pub piece_barcode: String,
    pub bulk_barcode: Option<String>,
    pub active: bool,
    pub display_order: i32,
}

/// Editable product columns
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub short_name: String,
    pub piece_suffix: String,
    pub bulk_suffix: String,
    pub piece_barcode: String,
    pub bulk_barcode: Option<String>,
    pub active: bool,
    pub display_order: i32,
}
