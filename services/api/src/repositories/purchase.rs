//! Purchase repository for database operations

use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::info;

use crate::models::{BuyRequest, Product, Purchase, PurchaseDetail};

/// Load the detail lines of a purchase together with their products
pub(crate) async fn load_details(
    conn: &mut SqliteConnection,
    purchase_id: i64,
) -> DatabaseResult<Vec<PurchaseDetail>> {
    let rows = sqlx::query(
        r#"
        SELECT d.id, d.purchase_id, d.product_id, d.quantity, d.total, d.created_at, d.updated_at,
               p.name AS product_name, p.price AS product_price, p.barcode AS product_barcode,
               p.is_disabled AS product_is_disabled, p.created_at AS product_created_at,
               p.updated_at AS product_updated_at
        FROM purchase_details d
        JOIN products p ON p.id = d.product_id
        WHERE d.purchase_id = ?
        ORDER BY d.id
        "#,
    )
    .bind(purchase_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|row| -> DatabaseResult<PurchaseDetail> {
            let product_id: i64 = row.try_get("product_id")?;
            Ok(PurchaseDetail {
                id: row.try_get("id")?,
                purchase_id: row.try_get("purchase_id")?,
                product_id,
                quantity: row.try_get("quantity")?,
                total: row.try_get("total")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
                product: Product {
                    id: product_id,
                    name: row.try_get("product_name")?,
                    price: row.try_get("product_price")?,
                    barcode: row.try_get("product_barcode")?,
                    is_disabled: row.try_get("product_is_disabled")?,
                    created_at: row.try_get("product_created_at")?,
                    updated_at: row.try_get("product_updated_at")?,
                },
            })
        })
        .collect()
}

/// Fill in the detail lines of freshly selected purchases
pub(crate) async fn with_details(
    conn: &mut SqliteConnection,
    mut purchases: Vec<Purchase>,
) -> DatabaseResult<Vec<Purchase>> {
    for purchase in purchases.iter_mut() {
        purchase.purchase_details = load_details(conn, purchase.id).await?;
    }
    Ok(purchases)
}

/// Purchases of a user, oldest first
pub(crate) async fn load_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> DatabaseResult<Vec<Purchase>> {
    let purchases = sqlx::query_as::<_, Purchase>(
        r#"
        SELECT id, user_id, payment_id, created_at, updated_at
        FROM purchases
        WHERE user_id = ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    with_details(conn, purchases).await
}

/// Purchases settled by a payment
pub(crate) async fn load_by_payment(
    conn: &mut SqliteConnection,
    payment_id: i64,
) -> DatabaseResult<Vec<Purchase>> {
    let purchases = sqlx::query_as::<_, Purchase>(
        r#"
        SELECT id, user_id, payment_id, created_at, updated_at
        FROM purchases
        WHERE payment_id = ?
        ORDER BY id
        "#,
    )
    .bind(payment_id)
    .fetch_all(&mut *conn)
    .await?;

    with_details(conn, purchases).await
}

/// A validated purchase line ready to be written
struct PricedLine {
    product_id: i64,
    quantity: i64,
    total: i64,
}

/// Purchase repository
#[derive(Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

impl PurchaseRepository {
    /// Create a new purchase repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all purchases
    pub async fn get_all(&self) -> DatabaseResult<Vec<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, user_id, payment_id, created_at, updated_at
            FROM purchases
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        with_details(&mut conn, purchases).await
    }

    /// Get every purchase that has not been paid yet
    pub async fn get_not_paid(&self) -> DatabaseResult<Vec<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, user_id, payment_id, created_at, updated_at
            FROM purchases
            WHERE payment_id IS NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        with_details(&mut conn, purchases).await
    }

    /// Get the unpaid purchases of one user
    pub async fn get_not_paid_by_user(&self, user_id: i64) -> DatabaseResult<Vec<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        let purchases = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, user_id, payment_id, created_at, updated_at
            FROM purchases
            WHERE user_id = ? AND payment_id IS NULL
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        with_details(&mut conn, purchases).await
    }

    /// Find a purchase by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Purchase>> {
        let mut conn = self.pool.acquire().await?;
        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, user_id, payment_id, created_at, updated_at
            FROM purchases
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match purchase {
            Some(mut purchase) => {
                purchase.purchase_details = load_details(&mut conn, purchase.id).await?;
                Ok(Some(purchase))
            }
            None => Ok(None),
        }
    }

    /// Record a purchase for an active user
    ///
    /// Every line is priced from the product's current price. Nothing is written
    /// unless the user and every product exist and are enabled.
    pub async fn create(&self, request: &BuyRequest) -> DatabaseResult<Purchase> {
        let mut tx = self.pool.begin().await?;

        let user: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE id = ? AND is_disabled = FALSE")
                .bind(request.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        if user.is_none() {
            return Err(DatabaseError::not_found("user", request.user_id));
        }

        let mut lines = Vec::with_capacity(request.details.len());
        for detail in &request.details {
            if detail.quantity <= 0 {
                return Err(DatabaseError::Invalid(format!(
                    "quantity for product {} must be positive",
                    detail.product_id
                )));
            }

            let price: Option<i64> =
                sqlx::query_scalar("SELECT price FROM products WHERE id = ? AND is_disabled = FALSE")
                    .bind(detail.product_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let price = price.ok_or_else(|| DatabaseError::not_found("product", detail.product_id))?;

            let total = detail.quantity.checked_mul(price).ok_or_else(|| {
                DatabaseError::Invalid(format!(
                    "total for product {} is out of range",
                    detail.product_id
                ))
            })?;

            lines.push(PricedLine {
                product_id: detail.product_id,
                quantity: detail.quantity,
                total,
            });
        }

        let now = Utc::now();
        let purchase_id = sqlx::query(
            "INSERT INTO purchases (user_id, payment_id, created_at, updated_at) VALUES (?, NULL, ?, ?)",
        )
        .bind(request.user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for line in &lines {
            sqlx::query(
                r#"
                INSERT INTO purchase_details (purchase_id, product_id, quantity, total, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(purchase_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.total)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(
            "Created purchase {} for user {} with {} lines",
            purchase_id,
            request.user_id,
            lines.len()
        );

        self.find_by_id(purchase_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("purchase", purchase_id))
    }
}
