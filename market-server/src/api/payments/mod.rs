//! Payment webhook module
//!
//! Inbound callback from the payment gateway. Delivery is at-least-once;
//! the order core treats duplicate outcomes as no-ops.

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

/// Payment router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/payments/webhook", post(handler::webhook))
}
