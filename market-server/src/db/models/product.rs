//! Product Model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type ProductId = RecordId;

/// Product listing
///
/// Available stock is NOT stored here: the inventory ledger in the order
/// core is authoritative for quantities, so reservations and order writes
/// stay in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<ProductId>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Sales unit, e.g. "kg", "crate"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Owning farmer (verified to hold the Farmer role at registration)
    pub farmer_id: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Plain-string key of this product's record id
    pub fn key(&self) -> Option<String> {
        self.id.as_ref().map(|id| id.key().to_string())
    }
}

/// Create DTO for a product listing
#[derive(Debug, Clone, Serialize, Deserialize, validator::Validate)]
pub struct ProductCreate {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 0.01, message = "price must be positive"))]
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Initial stock, seeded into the inventory ledger
    pub stock: u32,
}
