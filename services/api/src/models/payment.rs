//! Payment model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Purchase;

/// Immutable settlement of one or more purchases of a single user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub purchases: Vec<Purchase>,
}

impl Payment {
    /// Amount settled by this payment
    pub fn total(&self) -> i64 {
        self.purchases.iter().map(Purchase::total).sum()
    }
}

/// Request for paying a set of unpaid purchases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
    pub user_id: i64,
    #[serde(default)]
    pub purchase_ids: Vec<i64>,
}
