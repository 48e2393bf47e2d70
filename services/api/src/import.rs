//! Import of legacy ledger exports
//!
//! Every legacy transaction becomes its own purchase with a single line of the
//! fallback product. Settled transactions share one payment per distinct
//! `deleted_at` value, and the payments are built in ascending key order before
//! purchases are linked to them, so identical input always yields identical
//! graphs. A document whose username already exists is skipped.

use chrono::{DateTime, Duration, Utc};
use common::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    models::{ImportFailure, ImportSummary, LegacyDocument, Product},
    repositories::{ProductRepository, username_exists},
};

/// Errors that abort an import batch
#[derive(Error, Debug)]
pub enum ImportError {
    /// A document is not a valid legacy export
    #[error("malformed legacy document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A timestamp cannot be represented
    #[error("timestamp {0} is out of range")]
    Timestamp(f64),

    /// The fallback product is not in the catalog
    #[error("fallback product {0} not found")]
    FallbackProductMissing(i64),

    /// The plan references a payment that was never built
    #[error("purchase references unknown payment {0}")]
    UnknownPayment(usize),

    /// Storage failure outside a single document
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Convert fractional seconds since the epoch into a timestamp
///
/// The integral part gives whole seconds and the fractional part is scaled to
/// nanoseconds (truncated), so `1.5` is one second plus 500,000,000 ns.
pub fn fractional_seconds_to_datetime(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }

    let seconds = value.trunc();
    if seconds < i64::MIN as f64 || seconds > i64::MAX as f64 {
        return None;
    }
    let nanos = ((value - seconds) * 1e9) as i64;

    DateTime::from_timestamp(seconds as i64, 0)?.checked_add_signed(Duration::nanoseconds(nanos))
}

fn convert(value: f64) -> Result<DateTime<Utc>, ImportError> {
    fractional_seconds_to_datetime(value).ok_or(ImportError::Timestamp(value))
}

/// Synthetic payment for one distinct `deleted_at` value
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPayment {
    pub key: f64,
    pub created_at: DateTime<Utc>,
}

/// Synthetic single-line purchase for one legacy transaction
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPurchase {
    pub quantity: i64,
    pub total: i64,
    pub product_id: i64,
    pub created_at: DateTime<Utc>,
    /// Index into [`ImportPlan::payments`]
    pub payment: Option<usize>,
}

/// Everything one document will write
#[derive(Debug, Clone, PartialEq)]
pub struct ImportPlan {
    pub username: String,
    pub display_name: String,
    pub purchases: Vec<PlannedPurchase>,
    pub payments: Vec<PlannedPayment>,
}

/// Turn a legacy document into purchases and shared payments
///
/// Transactions are grouped by exact equality of `deleted_at`.
pub fn reconcile(document: &LegacyDocument, fallback_product_id: i64) -> Result<ImportPlan, ImportError> {
    let mut keys: Vec<f64> = document
        .transactions
        .iter()
        .filter_map(|transaction| transaction.deleted_at)
        .collect();
    keys.sort_by(f64::total_cmp);
    keys.dedup();

    let payments = keys
        .into_iter()
        .map(|key| -> Result<PlannedPayment, ImportError> {
            Ok(PlannedPayment {
                key,
                created_at: convert(key)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut purchases = Vec::with_capacity(document.transactions.len());
    for transaction in &document.transactions {
        let payment = match transaction.deleted_at {
            Some(deleted_at) => {
                let settled_at = convert(deleted_at)?;
                let index = payments
                    .iter()
                    .position(|payment| payment.created_at == settled_at)
                    .ok_or(ImportError::UnknownPayment(purchases.len()))?;
                Some(index)
            }
            None => None,
        };

        purchases.push(PlannedPurchase {
            quantity: transaction.amount,
            total: transaction.amount,
            product_id: fallback_product_id,
            created_at: convert(transaction.created_at)?,
            payment,
        });
    }

    Ok(ImportPlan {
        username: document.user.clone(),
        display_name: document.user.clone(),
        purchases,
        payments,
    })
}

/// Result of importing one document
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Imported { user_id: i64 },
    Skipped,
}

/// Writes reconciled legacy documents
#[derive(Clone)]
pub struct Importer {
    pool: SqlitePool,
    products: ProductRepository,
    fallback_product_id: i64,
}

impl Importer {
    /// Create a new importer attaching legacy lines to `fallback_product_id`
    pub fn new(pool: SqlitePool, fallback_product_id: i64) -> Self {
        Self {
            products: ProductRepository::new(pool.clone()),
            pool,
            fallback_product_id,
        }
    }

    /// The product legacy lines are booked against
    pub async fn fallback_product(&self) -> Result<Product, ImportError> {
        self.products
            .find_any_by_id(self.fallback_product_id)
            .await?
            .ok_or(ImportError::FallbackProductMissing(self.fallback_product_id))
    }

    /// Import a batch of raw documents in order
    ///
    /// A malformed document or a missing fallback product aborts the batch;
    /// documents committed before it stay committed. A document whose write
    /// fails is reported in the summary and the batch continues.
    pub async fn import_raw<I, B>(&self, documents: I) -> Result<ImportSummary, ImportError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let fallback = self.fallback_product().await?;
        let mut summary = ImportSummary::default();

        for raw in documents {
            let document: LegacyDocument = serde_json::from_slice(raw.as_ref())?;
            self.import_into(&document, &fallback, &mut summary).await?;
        }

        Ok(summary)
    }

    /// Import one parsed document, recording the outcome in `summary`
    pub async fn import_into(
        &self,
        document: &LegacyDocument,
        fallback: &Product,
        summary: &mut ImportSummary,
    ) -> Result<(), ImportError> {
        let plan = reconcile(document, fallback.id)?;
        match self.persist(&plan).await {
            Ok(ImportOutcome::Imported { user_id }) => {
                info!(
                    "Imported legacy user {} as user {} ({} purchases, {} payments)",
                    plan.username,
                    user_id,
                    plan.purchases.len(),
                    plan.payments.len()
                );
                summary.imported.push(plan.username);
            }
            Ok(ImportOutcome::Skipped) => {
                warn!("Skipping legacy user {}: username already exists", plan.username);
                summary.skipped.push(plan.username);
            }
            Err(e) => {
                error!("Failed to import legacy user {}: {}", plan.username, e);
                summary.failed.push(ImportFailure {
                    user: plan.username,
                    error: e.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Write the user, alias, payments and purchases of a plan in one transaction
    pub async fn persist(&self, plan: &ImportPlan) -> DatabaseResult<ImportOutcome> {
        let mut tx = self.pool.begin().await?;

        if username_exists(&mut *tx, &plan.username).await? {
            return Ok(ImportOutcome::Skipped);
        }

        let now = Utc::now();
        let user_id = sqlx::query(
            "INSERT INTO users (display_name, is_disabled, created_at, updated_at) VALUES (?, FALSE, ?, ?)",
        )
        .bind(&plan.display_name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query("INSERT INTO usernames (name, user_id, created_at, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&plan.username)
            .bind(user_id)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let mut payment_ids = Vec::with_capacity(plan.payments.len());
        for payment in &plan.payments {
            let id = sqlx::query("INSERT INTO payments (user_id, created_at, updated_at) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(payment.created_at)
                .bind(payment.created_at)
                .execute(&mut *tx)
                .await?
                .last_insert_rowid();
            payment_ids.push(id);
        }

        for purchase in &plan.purchases {
            let payment_id = match purchase.payment {
                Some(index) => Some(payment_ids.get(index).copied().ok_or_else(|| {
                    DatabaseError::Invalid(format!("purchase references unknown payment {}", index))
                })?),
                None => None,
            };

            let purchase_id = sqlx::query(
                "INSERT INTO purchases (user_id, payment_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(payment_id)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

            sqlx::query(
                r#"
                INSERT INTO purchase_details (purchase_id, product_id, quantity, total, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(purchase_id)
            .bind(purchase.product_id)
            .bind(purchase.quantity)
            .bind(purchase.total)
            .bind(purchase.created_at)
            .bind(purchase.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(ImportOutcome::Imported { user_id })
    }
}
