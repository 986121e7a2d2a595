//! User roles
//!
//! Account records and session issuance live outside this system; requests
//! arrive with a verified `{user_id, role}` pair and the server only needs
//! the role taxonomy.

use serde::{Deserialize, Serialize};

/// Marketplace role carried in the auth token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Places orders and pays for them
    Buyer,
    /// Owns products and accepts/declines line items
    Farmer,
    /// Delivers orders and reports location
    Supplier,
}

impl UserRole {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Farmer => "farmer",
            Self::Supplier => "supplier",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "farmer" => Ok(Self::Farmer),
            "supplier" => Ok(Self::Supplier),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}
