//! Notification inbox handlers

use axum::extract::State;

use shared::models::Notification;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// The caller's inbox, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<Notification>>> {
    let notifications = state.orders.notifications_for(&user.user_id)?;
    Ok(ApiResponse::success(notifications))
}
