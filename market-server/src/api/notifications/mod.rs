//! Notification inbox module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Notification router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/notifications", get(handler::list))
}
