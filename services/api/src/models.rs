//! API models for request and response payloads

use serde::{Deserialize, Serialize};

pub mod legacy;
pub mod payment;
pub mod product;
pub mod purchase;
pub mod user;
pub mod username;

pub use legacy::{ImportFailure, ImportSummary, LegacyDocument, LegacyTransaction};
pub use payment::{PayRequest, Payment};
pub use product::{CreateProductRequest, Product, UpdateProductRequest};
pub use purchase::{BuyRequest, BuyRequestDetail, NotPaidResponse, Purchase, PurchaseDetail};
pub use user::{CreateUserRequest, User};
pub use username::{NewUsernameRequest, Username, UsernameWithUser};

/// Acknowledgement returned by delete endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}
