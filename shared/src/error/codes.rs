//! Standardized error codes
//!
//! Numeric codes grouped by range so the category of a failure is derivable
//! from the code alone (see [`super::ErrorCategory`]).

use http::StatusCode;
use serde::{Deserialize, Serialize};

/// Standardized error code
///
/// The numeric value is stable wire format; renaming a variant is fine,
/// renumbering is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    /// Success (not an error)
    Success = 0,

    // ========== Validation (0xxx) ==========
    /// Input failed validation
    ValidationFailed = 2,
    /// Resource not found (generic)
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Malformed request
    InvalidRequest = 6,

    // ========== Authentication (1xxx) ==========
    /// No credentials presented
    NotAuthenticated = 1001,
    /// Token failed verification
    TokenInvalid = 1002,
    /// Token expired
    TokenExpired = 1003,

    // ========== Permission (2xxx) ==========
    /// Caller lacks the role or ownership for the action
    PermissionDenied = 2001,
    /// The (role, target-status) pair is not in the transition table
    ForbiddenTransition = 2002,

    // ========== Resource (3xxx) ==========
    /// Order does not exist
    OrderNotFound = 3001,
    /// Product does not exist or is not available
    ProductNotFound = 3002,
    /// Line item does not exist on the order
    ItemNotFound = 3003,
    /// Payment transaction reference is unknown
    PaymentNotFound = 3004,

    // ========== Conflict (4xxx) ==========
    /// Line item already reached a terminal status
    ItemAlreadyDecided = 4001,
    /// Order state forbids cancellation
    OrderNotCancellable = 4002,
    /// Payment preconditions not met
    OrderNotPayable = 4003,
    /// Order already has an active delivery
    DeliveryAlreadyAssigned = 4004,
    /// Status transition not legal from the current state
    InvalidTransition = 4005,

    // ========== Capacity (5xxx) ==========
    /// Requested quantity exceeds available stock
    InsufficientStock = 5001,

    // ========== External (6xxx) ==========
    /// Payment gateway unreachable
    GatewayUnavailable = 6001,
    /// Payment gateway rejected the request
    GatewayRejected = 6002,

    // ========== System (9xxx) ==========
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::NotAuthenticated => "Authentication required",
            Self::TokenInvalid => "Invalid token",
            Self::TokenExpired => "Token expired",
            Self::PermissionDenied => "Permission denied",
            Self::ForbiddenTransition => "Transition not permitted for this role",
            Self::OrderNotFound => "Order not found",
            Self::ProductNotFound => "Product not found",
            Self::ItemNotFound => "Line item not found",
            Self::PaymentNotFound => "Payment transaction not found",
            Self::ItemAlreadyDecided => "Line item already decided",
            Self::OrderNotCancellable => "Order can no longer be cancelled",
            Self::OrderNotPayable => "Order is not payable",
            Self::DeliveryAlreadyAssigned => "Delivery already assigned",
            Self::InvalidTransition => "Invalid status transition",
            Self::InsufficientStock => "Insufficient stock",
            Self::GatewayUnavailable => "Payment gateway unavailable",
            Self::GatewayRejected => "Payment gateway rejected the request",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::ValidationFailed | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated | Self::TokenInvalid | Self::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            Self::PermissionDenied | Self::ForbiddenTransition => StatusCode::FORBIDDEN,
            Self::NotFound
            | Self::OrderNotFound
            | Self::ProductNotFound
            | Self::ItemNotFound
            | Self::PaymentNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists
            | Self::ItemAlreadyDecided
            | Self::OrderNotCancellable
            | Self::OrderNotPayable
            | Self::DeliveryAlreadyAssigned
            | Self::InvalidTransition => StatusCode::CONFLICT,
            Self::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
            Self::GatewayUnavailable | Self::GatewayRejected => StatusCode::BAD_GATEWAY,
            Self::InternalError | Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned when a numeric value does not map to a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl std::fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            6 => Self::InvalidRequest,
            1001 => Self::NotAuthenticated,
            1002 => Self::TokenInvalid,
            1003 => Self::TokenExpired,
            2001 => Self::PermissionDenied,
            2002 => Self::ForbiddenTransition,
            3001 => Self::OrderNotFound,
            3002 => Self::ProductNotFound,
            3003 => Self::ItemNotFound,
            3004 => Self::PaymentNotFound,
            4001 => Self::ItemAlreadyDecided,
            4002 => Self::OrderNotCancellable,
            4003 => Self::OrderNotPayable,
            4004 => Self::DeliveryAlreadyAssigned,
            4005 => Self::InvalidTransition,
            5001 => Self::InsufficientStock,
            6001 => Self::GatewayUnavailable,
            6002 => Self::GatewayRejected,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::NotAuthenticated,
            ErrorCode::PermissionDenied,
            ErrorCode::OrderNotFound,
            ErrorCode::ItemAlreadyDecided,
            ErrorCode::InsufficientStock,
            ErrorCode::GatewayUnavailable,
            ErrorCode::InternalError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_unknown_code() {
        assert_eq!(ErrorCode::try_from(7777), Err(InvalidErrorCode(7777)));
    }

    #[test]
    fn test_http_status() {
        assert_eq!(
            ErrorCode::InsufficientStock.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ErrorCode::ForbiddenTransition.http_status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ErrorCode::GatewayUnavailable.http_status(),
            StatusCode::BAD_GATEWAY
        );
    }
}
