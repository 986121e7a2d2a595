//! JWT authentication
//!
//! Session issuance lives outside this system; the server only verifies
//! bearer tokens and extracts the caller's identity and role.

mod extractor;
mod jwt;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService};

use shared::models::UserRole;

use crate::utils::AppError;

/// Authenticated caller, extracted from a verified token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
    pub role: UserRole,
}

impl CurrentUser {
    /// Reject callers that do not hold the given role
    pub fn require_role(&self, role: UserRole) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::permission_denied(format!(
                "This action requires the {} role",
                role
            )))
        }
    }
}

impl TryFrom<Claims> for CurrentUser {
    type Error = String;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let role: UserRole = claims.role.parse()?;
        Ok(Self {
            user_id: claims.sub,
            role,
        })
    }
}
