//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`products`] - 商品目录接口
//! - [`orders`] - 订单接口（创建、列表、行项决定、状态、支付、配送）
//! - [`payments`] - 支付网关回调
//! - [`notifications`] - 通知收件箱
//! - [`tracking`] - 位置上报与 WebSocket 订阅

pub mod health;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod products;
pub mod tracking;

use axum::Router;

use crate::core::ServerState;

/// Compose all resource routers
pub fn router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(payments::router())
        .merge(notifications::router())
        .merge(tracking::router())
}
