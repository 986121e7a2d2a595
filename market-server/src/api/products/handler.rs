//! Product API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use validator::Validate;

use shared::models::UserRole;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate};
use crate::utils::{ApiResponse, AppError, AppResult};

/// Product plus its current ledger availability
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub farmer_id: String,
    pub available: u64,
}

fn view(state: &ServerState, product: Product) -> AppResult<ProductView> {
    let id = product
        .key()
        .ok_or_else(|| AppError::internal("Product record without id"))?;
    let available = state.orders.available_stock(&id).map_err(AppError::from)?;
    Ok(ProductView {
        id,
        name: product.name,
        description: product.description,
        price: product.price,
        unit: product.unit,
        farmer_id: product.farmer_id,
        available,
    })
}

/// Register a product listing (farmer only) and seed its stock
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<ApiResponse<ProductView>> {
    user.require_role(UserRole::Farmer)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let stock = payload.stock;
    let product = state
        .catalog
        .register_product(&user.user_id, payload)
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    if let Some(id) = product.key()
        && stock > 0
    {
        state
            .orders
            .restock(&id, u64::from(stock))
            .map_err(AppError::from)?;
    }

    Ok(ApiResponse::success(view(&state, product)?))
}

/// List all active products
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<ProductView>>> {
    let products = state
        .catalog
        .list_products()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;

    let mut views = Vec::with_capacity(products.len());
    for product in products {
        views.push(view(&state, product)?);
    }
    Ok(ApiResponse::success(views))
}

/// Get product by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ProductView>> {
    let product = state
        .catalog
        .get_product(&id)
        .await
        .map_err(|e| AppError::database(e.to_string()))?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
    Ok(ApiResponse::success(view(&state, product)?))
}
