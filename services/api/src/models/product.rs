//! Product model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Prefix of the barcode assigned to products created without one
pub const PRIVATE_BARCODE_PREFIX: &str = "CC-Food-";

/// Sellable catalog item, priced in the minor currency unit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub barcode: String,
    pub is_disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub price: i64,
    /// Missing or empty barcodes get a private `CC-Food-<id>` barcode
    #[serde(default)]
    pub barcode: Option<String>,
}

/// Product update payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProductRequest {
    pub name: String,
    pub price: i64,
    /// Missing or empty barcodes keep the current one
    #[serde(default)]
    pub barcode: Option<String>,
}

/// Barcode for a product created without one
pub fn private_barcode(id: i64) -> String {
    format!("{}{}", PRIVATE_BARCODE_PREFIX, id)
}

/// Treat empty barcodes the same as missing ones
pub(crate) fn normalize_barcode(barcode: Option<&str>) -> Option<&str> {
    barcode.map(str::trim).filter(|code| !code.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_barcode() {
        assert_eq!(private_barcode(12), "CC-Food-12");
    }

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode(None), None);
        assert_eq!(normalize_barcode(Some("")), None);
        assert_eq!(normalize_barcode(Some("  ")), None);
        assert_eq!(normalize_barcode(Some("4711")), Some("4711"));
    }
}
