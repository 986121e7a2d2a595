//! Shared types for the FarmHub marketplace
//!
//! Common types used by the market server and its clients: the unified
//! error system, domain model types, the real-time tracking wire protocol,
//! and small utilities.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use message::{ClientMessage, ServerMessage};
