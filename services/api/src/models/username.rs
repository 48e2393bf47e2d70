//! Username (alias) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::User;

/// Unique alias owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Username {
    pub id: i64,
    pub name: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Alias together with its owning user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernameWithUser {
    #[serde(flatten)]
    pub username: Username,
    pub user: User,
}

/// Request for appending an alias to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUsernameRequest {
    pub name: String,
}
