//! Purchase models and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Product;

/// Purchase with its detail lines; `payment_id` is `None` while unpaid
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: i64,
    pub user_id: i64,
    pub payment_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub purchase_details: Vec<PurchaseDetail>,
}

impl Purchase {
    /// Sum of the line totals
    pub fn total(&self) -> i64 {
        self.purchase_details.iter().map(|detail| detail.total).sum()
    }

    pub fn is_paid(&self) -> bool {
        self.payment_id.is_some()
    }
}

/// Purchase line; `total` is a snapshot of quantity times the price at purchase time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseDetail {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub product: Product,
}

/// One requested line of a purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyRequestDetail {
    pub product_id: i64,
    pub quantity: i64,
}

/// Request for purchase creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyRequest {
    pub user_id: i64,
    #[serde(default)]
    pub details: Vec<BuyRequestDetail>,
}

/// Response for the unpaid purchase listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotPaidResponse {
    pub purchases: Vec<Purchase>,
}
