//! User model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{Payment, Purchase, Username};

/// User aggregate with its aliases, purchases and payments preloaded
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub display_name: String,
    pub is_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    #[serde(default)]
    pub usernames: Vec<Username>,
    #[sqlx(skip)]
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    #[sqlx(skip)]
    #[serde(default)]
    pub payments: Vec<Payment>,
}

/// Request for user creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub usernames: Vec<String>,
    pub display_name: String,
}
