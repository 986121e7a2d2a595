use thiserror::Error;

use shared::error::{AppError, ErrorCode};
use shared::models::{OrderStatus, UserRole};

use crate::orders::storage::StorageError;
use crate::payment::GatewayError;

/// Order state machine errors
///
/// Each variant maps onto exactly one [`ErrorCode`], so the API layer can
/// report a machine-checkable category for every rejected mutation.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("{0}")]
    Validation(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Line item not found: {0}")]
    ItemNotFound(String),

    #[error("Payment transaction not found: {0}")]
    PaymentNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Transition to {target:?} is not permitted for role {role:?}")]
    ForbiddenTransition { role: UserRole, target: OrderStatus },

    #[error("Line item {0} already reached a terminal status")]
    ItemAlreadyDecided(String),

    #[error("{0}")]
    NotCancellable(String),

    #[error("{0}")]
    NotPayable(String),

    #[error("Order {0} already has an active delivery")]
    DeliveryAlreadyAssigned(String),

    #[error("{0}")]
    InvalidTransition(String),

    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: String,
        requested: u64,
        available: u64,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type OrderResult<T> = Result<T, OrderError>;

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Storage(e) => {
                tracing::error!(error = %e, "Storage error in order core");
                AppError::with_message(ErrorCode::DatabaseError, e.to_string())
            }
            OrderError::Validation(msg) => AppError::with_message(ErrorCode::ValidationFailed, msg),
            OrderError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
                    .with_detail("order_id", id)
            }
            OrderError::ProductNotFound(id) => AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {} not found", id),
            )
            .with_detail("product_id", id),
            OrderError::ItemNotFound(id) => AppError::with_message(
                ErrorCode::ItemNotFound,
                format!("Line item {} not found", id),
            )
            .with_detail("item_id", id),
            OrderError::PaymentNotFound(reference) => AppError::with_message(
                ErrorCode::PaymentNotFound,
                format!("Payment {} not found", reference),
            )
            .with_detail("reference", reference),
            OrderError::PermissionDenied(msg) => {
                AppError::with_message(ErrorCode::PermissionDenied, msg)
            }
            OrderError::ForbiddenTransition { role, target } => AppError::with_message(
                ErrorCode::ForbiddenTransition,
                format!("Role {} may not set order status {:?}", role, target),
            ),
            OrderError::ItemAlreadyDecided(id) => AppError::with_message(
                ErrorCode::ItemAlreadyDecided,
                format!("Line item {} already decided", id),
            )
            .with_detail("item_id", id),
            OrderError::NotCancellable(msg) => {
                AppError::with_message(ErrorCode::OrderNotCancellable, msg)
            }
            OrderError::NotPayable(msg) => AppError::with_message(ErrorCode::OrderNotPayable, msg),
            OrderError::DeliveryAlreadyAssigned(id) => AppError::with_message(
                ErrorCode::DeliveryAlreadyAssigned,
                format!("Order {} already has an active delivery", id),
            )
            .with_detail("order_id", id),
            OrderError::InvalidTransition(msg) => {
                AppError::with_message(ErrorCode::InvalidTransition, msg)
            }
            OrderError::InsufficientStock {
                product_id,
                requested,
                available,
            } => AppError::with_message(
                ErrorCode::InsufficientStock,
                format!(
                    "Insufficient stock for product {}: requested {}, available {}",
                    product_id, requested, available
                ),
            )
            .with_detail("product_id", product_id)
            .with_detail("requested", requested)
            .with_detail("available", available),
            OrderError::Gateway(e) => {
                let code = match &e {
                    GatewayError::Unavailable(_) => ErrorCode::GatewayUnavailable,
                    GatewayError::Rejected(_) => ErrorCode::GatewayRejected,
                };
                AppError::with_message(code, e.to_string())
            }
            OrderError::Internal(msg) => AppError::with_message(ErrorCode::InternalError, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCategory;

    #[test]
    fn test_error_categories_line_up() {
        let err: AppError = OrderError::InsufficientStock {
            product_id: "p1".to_string(),
            requested: 5,
            available: 2,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Capacity);

        let err: AppError = OrderError::ItemAlreadyDecided("i1".to_string()).into();
        assert_eq!(err.category(), ErrorCategory::Conflict);

        let err: AppError = OrderError::ForbiddenTransition {
            role: UserRole::Buyer,
            target: OrderStatus::Shipped,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Permission);

        let err: AppError =
            OrderError::Gateway(GatewayError::Unavailable("timeout".to_string())).into();
        assert_eq!(err.category(), ErrorCategory::External);
    }
}
