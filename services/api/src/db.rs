//! Schema migrations and startup seeding

use common::error::{DatabaseError, DatabaseResult};
use sqlx::SqlitePool;
use tracing::info;

use crate::{models::Product, repositories::ProductRepository};

/// Apply the embedded schema migrations
pub async fn migrate(pool: &SqlitePool) -> DatabaseResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    info!("Database schema is up to date");
    Ok(())
}

/// Make sure the fallback product exists at its well-known id
pub async fn seed_fallback_product(pool: &SqlitePool, id: i64, name: &str) -> DatabaseResult<Product> {
    ProductRepository::new(pool.clone()).ensure_fallback(id, name).await
}
