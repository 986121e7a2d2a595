//! Tracking API handlers
//!
//! The WebSocket handler serves three streams over one connection:
//! the connect-time snapshot, the filtered tracking broadcast, and the
//! caller's per-user notification pushes.

use axum::{
    Json,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use validator::Validate;

use shared::message::{ClientMessage, ServerMessage, SubscriptionScope};
use shared::models::{SupplierPresence, UserRole};
use shared::util::now_millis;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppError, AppResult};

/// Periodic location ping from a supplier client
#[derive(Debug, Deserialize, Validate)]
pub struct LocationPing {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude out of range"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude out of range"))]
    pub longitude: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    /// Client timestamp in epoch millis; server time when absent
    #[serde(default)]
    pub timestamp: Option<i64>,
}

/// Record a location ping (supplier only)
pub async fn ingest_location(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<LocationPing>,
) -> AppResult<ApiResponse<()>> {
    user.require_role(UserRole::Supplier)?;
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    state
        .tracking
        .ingest(
            &user.user_id,
            payload.latitude,
            payload.longitude,
            payload.heading,
            payload.speed,
            payload.timestamp.unwrap_or_else(now_millis),
        )
        .await;
    Ok(ApiResponse::ok())
}

/// Presence toggle body
#[derive(Debug, Deserialize)]
pub struct PresenceUpdate {
    pub is_active: bool,
    #[serde(default)]
    pub service_area: Option<String>,
}

/// Toggle active/inactive (supplier only)
pub async fn set_presence(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<PresenceUpdate>,
) -> AppResult<ApiResponse<()>> {
    user.require_role(UserRole::Supplier)?;
    state
        .tracking
        .set_presence(
            &user.user_id,
            payload.is_active,
            payload.service_area,
            now_millis(),
        )
        .await;
    Ok(ApiResponse::ok())
}

/// Suppliers that are live right now (active AND within the staleness window)
pub async fn live_suppliers(
    State(state): State<ServerState>,
    _user: CurrentUser,
) -> AppResult<ApiResponse<Vec<SupplierPresence>>> {
    Ok(ApiResponse::success(state.tracking.live_suppliers()))
}

/// GET /api/tracking/ws: upgrade to WebSocket
pub async fn subscribe_ws(
    State(state): State<ServerState>,
    user: CurrentUser,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, user))
}

async fn handle_ws_connection(socket: WebSocket, state: ServerState, user: CurrentUser) {
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Per-user channel for notification pushes
    let (push_tx, mut push_rx) = mpsc::channel::<ServerMessage>(32);
    state.hub.register(&user.user_id, push_tx.clone());
    tracing::info!(user_id = %user.user_id, "Tracking subscriber connected");

    // Connect = one consistent snapshot of all active suppliers
    let snapshot = ServerMessage::Snapshot {
        suppliers: state.tracking.snapshot(),
    };
    if send_message(&mut ws_sink, &snapshot).await.is_err() {
        state.hub.unregister(&user.user_id, &push_tx);
        return;
    }

    let mut events = state.tracking.subscribe();
    // Default scope: the whole map; clients narrow it with a subscribe message
    let mut scope = SubscriptionScope {
        all: true,
        ..Default::default()
    };

    loop {
        tokio::select! {
            // Per-user notification push
            msg = push_rx.recv() => {
                match msg {
                    Some(message) => {
                        if send_message(&mut ws_sink, &message).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            // Tracking broadcast, filtered by subscription scope
            event = events.recv() => {
                match event {
                    Ok(message) => {
                        if scope_matches(&scope, &message)
                            && send_message(&mut ws_sink, &message).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Slow consumer: resync with a fresh snapshot instead
                        // of replaying what was dropped
                        tracing::warn!(user_id = %user.user_id, skipped = n, "Subscriber lagged, resyncing");
                        let snapshot = ServerMessage::Snapshot {
                            suppliers: state.tracking.snapshot(),
                        };
                        if send_message(&mut ws_sink, &snapshot).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            // Incoming client messages
            incoming = next_client_message(&mut ws_stream) => {
                match incoming {
                    Some(ClientMessage::Subscribe(new_scope)) => scope = new_scope,
                    Some(ClientMessage::Ping) => {}
                    None => break,
                }
            }
        }
    }

    state.hub.unregister(&user.user_id, &push_tx);
    tracing::info!(user_id = %user.user_id, "Tracking subscriber disconnected");
}

/// Read the next parseable client message; None when the socket is gone
async fn next_client_message(stream: &mut SplitStream<WebSocket>) -> Option<ClientMessage> {
    loop {
        match stream.next().await? {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => return Some(message),
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring malformed client message");
                }
            },
            Ok(Message::Close(_)) => return None,
            Ok(_) => {}
            Err(_) => return None,
        }
    }
}

fn scope_matches(scope: &SubscriptionScope, message: &ServerMessage) -> bool {
    if scope.all {
        return true;
    }
    if let Some(supplier_id) = message.supplier_id()
        && scope.suppliers.iter().any(|s| s == supplier_id)
    {
        return true;
    }
    if let Some(order_id) = message.order_id()
        && scope.orders.iter().any(|o| o == order_id)
    {
        return true;
    }
    false
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(message).unwrap_or_default();
    sink.send(Message::Text(json.into())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::DeliveryStatus;

    fn scope(all: bool, suppliers: &[&str], orders: &[&str]) -> SubscriptionScope {
        SubscriptionScope {
            all,
            suppliers: suppliers.iter().map(|s| s.to_string()).collect(),
            orders: orders.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn delivery_event() -> ServerMessage {
        ServerMessage::DeliveryStatusUpdate {
            supplier_id: "sup-1".to_string(),
            order_id: "ord-1".to_string(),
            status: DeliveryStatus::InTransit,
            timestamp: 1,
        }
    }

    #[test]
    fn test_scope_all() {
        assert!(scope_matches(&scope(true, &[], &[]), &delivery_event()));
    }

    #[test]
    fn test_scope_by_supplier() {
        assert!(scope_matches(
            &scope(false, &["sup-1"], &[]),
            &delivery_event()
        ));
        assert!(!scope_matches(
            &scope(false, &["sup-2"], &[]),
            &delivery_event()
        ));
    }

    #[test]
    fn test_scope_by_order_room() {
        assert!(scope_matches(
            &scope(false, &[], &["ord-1"]),
            &delivery_event()
        ));
        assert!(!scope_matches(
            &scope(false, &[], &["ord-2"]),
            &delivery_event()
        ));
    }
}
