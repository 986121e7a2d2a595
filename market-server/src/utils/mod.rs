//! Utility functions and re-exports

pub mod logger;

pub use shared::error::{ApiResponse, AppError, AppResult};
