//! Product repository for database operations

use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    CreateProductRequest, Product, UpdateProductRequest,
    product::{normalize_barcode, private_barcode},
};

/// Product repository
#[derive(Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Create a new product repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all enabled products
    pub async fn get_all(&self) -> DatabaseResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, barcode, is_disabled, created_at, updated_at
            FROM products
            WHERE is_disabled = FALSE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Find an enabled product by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, barcode, is_disabled, created_at, updated_at
            FROM products
            WHERE id = ? AND is_disabled = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Find a product by ID whether or not it is disabled
    pub async fn find_any_by_id(&self, id: i64) -> DatabaseResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, barcode, is_disabled, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Find an enabled product by barcode
    pub async fn find_by_barcode(&self, barcode: &str) -> DatabaseResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, barcode, is_disabled, created_at, updated_at
            FROM products
            WHERE barcode = ? AND is_disabled = FALSE
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Create a new product
    ///
    /// Products without a barcode get `CC-Food-<id>`; a random placeholder keeps
    /// the unique index satisfied until the id is known.
    pub async fn create(&self, request: &CreateProductRequest) -> DatabaseResult<Product> {
        validate_price(request.price)?;

        let barcode = normalize_barcode(request.barcode.as_deref());
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let id = sqlx::query(
            r#"
            INSERT INTO products (name, price, barcode, is_disabled, created_at, updated_at)
            VALUES (?, ?, ?, FALSE, ?, ?)
            "#,
        )
        .bind(&request.name)
        .bind(request.price)
        .bind(
            barcode
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
        )
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if barcode.is_none() {
            sqlx::query("UPDATE products SET barcode = ? WHERE id = ?")
                .bind(private_barcode(id))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Created product {} ({})", id, request.name);

        self.find_any_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("product", id))
    }

    /// Replace name, price and (when given) barcode of an enabled product
    pub async fn update(&self, id: i64, request: &UpdateProductRequest) -> DatabaseResult<Product> {
        validate_price(request.price)?;

        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("product", id))?;
        let barcode = normalize_barcode(request.barcode.as_deref())
            .map(str::to_string)
            .unwrap_or(current.barcode);

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?, price = ?, barcode = ?, updated_at = ?
            WHERE id = ? AND is_disabled = FALSE
            "#,
        )
        .bind(&request.name)
        .bind(request.price)
        .bind(&barcode)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        info!("Updated product {}", id);

        self.find_any_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("product", id))
    }

    /// Soft-delete a product; its historical purchase lines stay intact
    pub async fn disable(&self, id: i64) -> DatabaseResult<()> {
        let result = sqlx::query("UPDATE products SET is_disabled = TRUE, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("product", id));
        }

        info!("Disabled product {}", id);
        Ok(())
    }

    /// Insert the fallback product at a fixed id unless a product already holds it
    pub async fn ensure_fallback(&self, id: i64, name: &str) -> DatabaseResult<Product> {
        if let Some(product) = self.find_any_by_id(id).await? {
            return Ok(product);
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, barcode, is_disabled, created_at, updated_at)
            VALUES (?, ?, 1, ?, FALSE, ?, ?)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(private_barcode(id))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!("Seeded fallback product {} ({})", id, name);

        self.find_any_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("product", id))
    }
}

fn validate_price(price: i64) -> DatabaseResult<()> {
    if price < 0 {
        return Err(DatabaseError::Invalid(format!(
            "price must not be negative, got {}",
            price
        )));
    }
    Ok(())
}
