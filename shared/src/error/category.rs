//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: Validation errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Resource errors
/// - 4xxx: Conflict errors
/// - 5xxx: Capacity errors
/// - 6xxx: External collaborator errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or missing input (0xxx), rejected before any write
    Validation,
    /// Authentication errors (1xxx)
    Auth,
    /// Caller lacks role/ownership (2xxx)
    Permission,
    /// Referenced entity does not exist (3xxx)
    Resource,
    /// Legal request, current state forbids it (4xxx)
    Conflict,
    /// Insufficient stock (5xxx)
    Capacity,
    /// External collaborator failed (6xxx), safe to retry
    External,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::Validation,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Resource,
            4000..5000 => Self::Conflict,
            5000..6000 => Self::Capacity,
            6000..7000 => Self::External,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Resource => "resource",
            Self::Conflict => "conflict",
            Self::Capacity => "capacity",
            Self::External => "external",
            Self::System => "system",
        }
    }

    /// Whether retrying the same request unchanged can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::External | Self::System)
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::Validation);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Resource);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Conflict);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Capacity);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::External);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::ValidationFailed.category(),
            ErrorCategory::Validation
        );
        assert_eq!(ErrorCode::NotAuthenticated.category(), ErrorCategory::Auth);
        assert_eq!(
            ErrorCode::ForbiddenTransition.category(),
            ErrorCategory::Permission
        );
        assert_eq!(ErrorCode::OrderNotFound.category(), ErrorCategory::Resource);
        assert_eq!(
            ErrorCode::ItemAlreadyDecided.category(),
            ErrorCategory::Conflict
        );
        assert_eq!(
            ErrorCode::InsufficientStock.category(),
            ErrorCategory::Capacity
        );
        assert_eq!(
            ErrorCode::GatewayUnavailable.category(),
            ErrorCategory::External
        );
        assert_eq!(ErrorCode::InternalError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Conflict).unwrap();
        assert_eq!(json, "\"conflict\"");

        let category: ErrorCategory = serde_json::from_str("\"capacity\"").unwrap();
        assert_eq!(category, ErrorCategory::Capacity);
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCategory::External.is_retryable());
        assert!(!ErrorCategory::Conflict.is_retryable());
        assert!(!ErrorCategory::Validation.is_retryable());
    }
}
