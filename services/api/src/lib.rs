//! Canteen ledger REST service
//!
//! Users with aliases, a product catalog, purchases and the payments settling
//! them, stored in SQLite and served over HTTP/JSON. Also imports per-user
//! exports of the legacy ledger.

use common::error::DatabaseResult;
use sqlx::SqlitePool;

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;

pub use crate::{config::AppConfig, state::AppState};

/// Migrate the schema, seed the fallback product and build the handler state
pub async fn prepare_state(pool: SqlitePool, config: &AppConfig) -> DatabaseResult<AppState> {
    db::migrate(&pool).await?;
    db::seed_fallback_product(
        &pool,
        config.fallback_product_id,
        &config.fallback_product_name,
    )
    .await?;

    let upload_limit = usize::try_from(config.upload_limit_bytes).unwrap_or(usize::MAX);
    Ok(AppState::new(pool, config.fallback_product_id, upload_limit))
}
