//! Payment webhook handler

use axum::{Json, extract::State};
use serde::Deserialize;

use shared::models::PaymentOutcome;

use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// Gateway callback body
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub reference: String,
    pub outcome: PaymentOutcome,
}

/// Record an asynchronous payment outcome
pub async fn webhook(
    State(state): State<ServerState>,
    Json(payload): Json<WebhookPayload>,
) -> AppResult<ApiResponse<()>> {
    tracing::info!(reference = %payload.reference, outcome = ?payload.outcome, "Payment outcome received");
    state
        .orders
        .handle_payment_outcome(&payload.reference, payload.outcome)?;
    Ok(ApiResponse::ok())
}
