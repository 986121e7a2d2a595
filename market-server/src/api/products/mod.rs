//! Product API Module
//!
//! Minimal catalog surface: farmers register listings (which seeds the
//! inventory ledger), everyone can browse. Full listing management is out
//! of scope for the core.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Product router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create).get(handler::list))
        .route("/{id}", get(handler::get_by_id))
}
