use serde::{Deserialize, Serialize};

use crate::models::notification::NotificationKind;
use crate::models::order::DeliveryStatus;
use crate::models::presence::SupplierPresence;

// ==================== Server -> Client ====================

/// Server-to-client message on the tracking/notification socket
///
/// Each incremental tracking event is keyed by supplier id. A client that
/// missed events (reconnect, lag) recovers by treating the next `snapshot`
/// as authoritative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Point-in-time consistent copy of all active suppliers, sent on connect
    Snapshot { suppliers: Vec<SupplierPresence> },
    /// A supplier's position changed
    LocationUpdate { supplier: SupplierPresence },
    /// A supplier toggled active/inactive
    PresenceChange {
        supplier_id: String,
        is_active: bool,
        timestamp: i64,
    },
    /// The delivery a supplier is fulfilling progressed
    DeliveryStatusUpdate {
        supplier_id: String,
        order_id: String,
        status: DeliveryStatus,
        timestamp: i64,
    },
    /// Best-effort live copy of an inbox notification (per-user channel)
    Notification {
        message: String,
        kind: NotificationKind,
    },
}

impl ServerMessage {
    /// Supplier this event is keyed by, if it is a tracking event
    pub fn supplier_id(&self) -> Option<&str> {
        match self {
            Self::LocationUpdate { supplier } => Some(&supplier.supplier_id),
            Self::PresenceChange { supplier_id, .. } => Some(supplier_id),
            Self::DeliveryStatusUpdate { supplier_id, .. } => Some(supplier_id),
            Self::Snapshot { .. } | Self::Notification { .. } => None,
        }
    }

    /// Order room this event belongs to, if any
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::LocationUpdate { supplier } => {
                supplier.delivery.as_ref().map(|d| d.order_id.as_str())
            }
            Self::DeliveryStatusUpdate { order_id, .. } => Some(order_id),
            _ => None,
        }
    }
}

// ==================== Client -> Server ====================

/// Subscription scope requested by a client
///
/// `all` subscribes to every supplier (map view); otherwise events are
/// filtered to the listed supplier ids and order delivery rooms.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SubscriptionScope {
    #[serde(default)]
    pub all: bool,
    #[serde(default)]
    pub suppliers: Vec<String>,
    #[serde(default)]
    pub orders: Vec<String>,
}

/// Client-to-server message on the tracking socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replace the current subscription scope
    Subscribe(SubscriptionScope),
    /// Keep-alive
    Ping,
}
