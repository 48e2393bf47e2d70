//! Documents of the legacy ledger export and the import summary

use serde::{Deserialize, Serialize};

/// One transaction of the legacy export; timestamps are fractional seconds since the epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyTransaction {
    pub created_at: f64,
    /// Set once the transaction was settled
    #[serde(default)]
    pub deleted_at: Option<f64>,
    #[serde(default)]
    pub action: String,
    pub amount: i64,
}

/// Per-user legacy export document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyDocument {
    pub user: String,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub transactions: Vec<LegacyTransaction>,
}

/// A document whose graph could not be written
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportFailure {
    pub user: String,
    pub error: String,
}

/// Outcome of an import request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportSummary {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<ImportFailure>,
}
