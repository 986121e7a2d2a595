//! Order API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use shared::models::{
    CreateOrderRequest, DeliveryStatus, LineItemStatus, Order, OrderStatus, UserRole,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// Create an order (buyer only)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    user.require_role(UserRole::Buyer)?;
    let order = state.orders.create_order(&user.user_id, &payload)?;
    tracing::info!(order_number = %order.order_number, buyer = %user.user_id, "Order created");
    Ok(ApiResponse::success(order))
}

/// List my orders, filtered by role
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let orders = state.orders.list_orders_for(&user.user_id, user.role)?;
    Ok(ApiResponse::success(orders))
}

/// Get order by id (permission-checked)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    let order = state.orders.get_order_for(&id, &user.user_id, user.role)?;
    Ok(ApiResponse::success(order))
}

/// Line item decision body
#[derive(Debug, Deserialize)]
pub struct LineItemDecisionRequest {
    pub status: LineItemStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Accept or decline one line item (owning farmer only)
pub async fn update_line_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((id, item_id)): Path<(String, String)>,
    Json(payload): Json<LineItemDecisionRequest>,
) -> AppResult<ApiResponse<Order>> {
    user.require_role(UserRole::Farmer)?;
    let order = state.orders.update_line_item(
        &id,
        &item_id,
        &user.user_id,
        payload.status,
        payload.notes,
    )?;
    Ok(ApiResponse::success(order))
}

/// Order status transition body
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Role-gated order status transition
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<Order>> {
    let order =
        state
            .orders
            .update_order_status(&id, &user.user_id, user.role, payload.status)?;
    Ok(ApiResponse::success(order))
}

/// Payment initiation response
#[derive(Debug, Serialize)]
pub struct PaymentRedirect {
    pub redirect_url: String,
}

/// Initiate the online payment (buyer only)
pub async fn initiate_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PaymentRedirect>> {
    user.require_role(UserRole::Buyer)?;
    let redirect_url = state.orders.initiate_payment(&id, &user.user_id).await?;
    Ok(ApiResponse::success(PaymentRedirect { redirect_url }))
}

/// Claim this order's delivery (supplier only)
pub async fn claim_delivery(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Order>> {
    user.require_role(UserRole::Supplier)?;
    let order = state.orders.claim_delivery(&id, &user.user_id)?;
    Ok(ApiResponse::success(order))
}

/// Delivery progress body
#[derive(Debug, Deserialize)]
pub struct DeliveryUpdateRequest {
    pub status: DeliveryStatus,
}

/// Advance the delivery leg (assigned supplier only)
pub async fn update_delivery(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<DeliveryUpdateRequest>,
) -> AppResult<ApiResponse<Order>> {
    user.require_role(UserRole::Supplier)?;
    let order = state
        .orders
        .update_delivery_status(&id, &user.user_id, payload.status)?;
    Ok(ApiResponse::success(order))
}
