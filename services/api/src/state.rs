//! Application state shared across handlers

use sqlx::SqlitePool;

use crate::{
    import::Importer,
    repositories::{
        PaymentRepository, ProductRepository, PurchaseRepository, UserRepository,
        UsernameRepository,
    },
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub user_repository: UserRepository,
    pub username_repository: UsernameRepository,
    pub product_repository: ProductRepository,
    pub purchase_repository: PurchaseRepository,
    pub payment_repository: PaymentRepository,
    pub importer: Importer,
    pub upload_limit_bytes: usize,
}

impl AppState {
    /// Build the repositories on top of one pool
    pub fn new(pool: SqlitePool, fallback_product_id: i64, upload_limit_bytes: usize) -> Self {
        Self {
            user_repository: UserRepository::new(pool.clone()),
            username_repository: UsernameRepository::new(pool.clone()),
            product_repository: ProductRepository::new(pool.clone()),
            purchase_repository: PurchaseRepository::new(pool.clone()),
            payment_repository: PaymentRepository::new(pool.clone()),
            importer: Importer::new(pool.clone(), fallback_product_id),
            db_pool: pool,
            upload_limit_bytes,
        }
    }
}
