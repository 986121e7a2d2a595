//! Order API Module
//!
//! Every mutation goes through the OrdersManager; handlers only translate
//! HTTP to commands and enforce the caller's role where the command itself
//! is role-specific.

mod handler;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Create (buyer) / role-filtered list
        .route("/", post(handler::create).get(handler::list))
        // Order detail (permission-checked)
        .route("/{id}", get(handler::get_by_id))
        // Farmer decision on one line item
        .route("/{id}/items/{item_id}", patch(handler::update_line_item))
        // Role-gated order status transition
        .route("/{id}/status", patch(handler::update_status))
        // Online payment initiation (buyer)
        .route("/{id}/payment", post(handler::initiate_payment))
        // Delivery claim + progress (supplier)
        .route("/{id}/delivery/claim", post(handler::claim_delivery))
        .route("/{id}/delivery", patch(handler::update_delivery))
}
