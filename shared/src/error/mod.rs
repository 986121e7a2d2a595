//! Unified error system for the FarmHub marketplace
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized numeric error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by code range
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`]: Unified API response format
//!
//! # Error Code Ranges
//!
//! - 0xxx: Validation errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Resource errors
//! - 4xxx: Conflict errors
//! - 5xxx: Capacity errors
//! - 6xxx: External collaborator errors
//! - 9xxx: System errors
//!
//! Clients must branch on the serialized category rather than on the message
//! string: "fix your input" (validation), "this is not possible right now"
//! (conflict/permission), "try again" (external).
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! // Create a simple error
//! let err = AppError::new(ErrorCode::NotFound);
//!
//! // Create an error with custom message and details
//! let err = AppError::validation("Missing required field")
//!     .with_detail("field", "address");
//!
//! // Convert to API response
//! let response = ApiResponse::<()>::error(&err);
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
