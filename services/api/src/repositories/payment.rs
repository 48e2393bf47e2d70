//! Payment repository for database operations

use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::models::{PayRequest, Payment};

use super::purchase;

/// Fill in the purchases settled by each payment
async fn with_purchases(
    conn: &mut SqliteConnection,
    mut payments: Vec<Payment>,
) -> DatabaseResult<Vec<Payment>> {
    for payment in payments.iter_mut() {
        payment.purchases = purchase::load_by_payment(conn, payment.id).await?;
    }
    Ok(payments)
}

/// Payments of a user, oldest first
pub(crate) async fn load_by_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> DatabaseResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, user_id, created_at, updated_at
        FROM payments
        WHERE user_id = ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    with_purchases(conn, payments).await
}

/// Payment repository
#[derive(Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get all payments
    pub async fn get_all(&self) -> DatabaseResult<Vec<Payment>> {
        let mut conn = self.pool.acquire().await?;
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, created_at, updated_at
            FROM payments
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        with_purchases(&mut conn, payments).await
    }

    /// Find a payment by ID
    pub async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<Payment>> {
        let mut conn = self.pool.acquire().await?;
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, user_id, created_at, updated_at
            FROM payments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match payment {
            Some(mut payment) => {
                payment.purchases = purchase::load_by_payment(&mut conn, payment.id).await?;
                Ok(Some(payment))
            }
            None => Ok(None),
        }
    }

    /// Settle a set of unpaid purchases of one user with a single new payment
    ///
    /// Fails without writing anything if any purchase is missing, already paid,
    /// listed twice, or owned by another user.
    pub async fn create(&self, request: &PayRequest) -> DatabaseResult<Payment> {
        if request.purchase_ids.is_empty() {
            return Err(DatabaseError::Invalid(
                "a payment must cover at least one purchase".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let user: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
            .bind(request.user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(DatabaseError::not_found("user", request.user_id));
        }

        for &purchase_id in &request.purchase_ids {
            let owner: Option<i64> = sqlx::query_scalar(
                "SELECT user_id FROM purchases WHERE id = ? AND payment_id IS NULL",
            )
            .bind(purchase_id)
            .fetch_optional(&mut *tx)
            .await?;

            match owner {
                None => return Err(DatabaseError::not_found("unpaid purchase", purchase_id)),
                Some(owner) if owner != request.user_id => {
                    warn!(
                        "Rejected payment of purchase {} owned by user {} on behalf of user {}",
                        purchase_id, owner, request.user_id
                    );
                    return Err(DatabaseError::Invalid(format!(
                        "purchase {} does not belong to user {}",
                        purchase_id, request.user_id
                    )));
                }
                Some(_) => {}
            }
        }

        let now = Utc::now();
        let payment_id =
            sqlx::query("INSERT INTO payments (user_id, created_at, updated_at) VALUES (?, ?, ?)")
                .bind(request.user_id)
                .bind(now)
                .bind(now)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();

        for &purchase_id in &request.purchase_ids {
            let linked = sqlx::query(
                "UPDATE purchases SET payment_id = ?, updated_at = ? WHERE id = ? AND payment_id IS NULL",
            )
            .bind(payment_id)
            .bind(now)
            .bind(purchase_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if linked != 1 {
                return Err(DatabaseError::not_found("unpaid purchase", purchase_id));
            }
        }

        tx.commit().await?;
        info!(
            "Created payment {} for user {} covering {} purchases",
            payment_id,
            request.user_id,
            request.purchase_ids.len()
        );

        self.find_by_id(payment_id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("payment", payment_id))
    }
}
