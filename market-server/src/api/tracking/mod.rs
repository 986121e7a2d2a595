//! Tracking API module
//!
//! Supplier-side ingest (location pings, presence toggles) and the
//! subscriber WebSocket carrying the snapshot + incremental event stream.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Tracking router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/tracking", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        // Supplier ingest
        .route("/location", post(handler::ingest_location))
        .route("/presence", post(handler::set_presence))
        // Read-time liveness (active AND fresh)
        .route("/live", get(handler::live_suppliers))
        // Subscriber stream
        .route("/ws", get(handler::subscribe_ws))
}
