//! Notification inbox record
//!
//! The durable half of the notification fan-out. One record per interested
//! party per state transition, written before the triggering transaction
//! commits. The live push is best-effort and carries the same message/kind.

use serde::{Deserialize, Serialize};

/// Notification classification, used by clients for routing/badging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new order was placed (buyer confirmation, farmer alert)
    OrderPlaced,
    /// Order-level status change
    OrderUpdate,
    /// A farmer decided a line item
    ItemDecision,
    /// Payment leg progressed
    PaymentUpdate,
    /// Delivery leg progressed
    DeliveryUpdate,
}

/// Durable inbox record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at: i64,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    pub fn new(
        user_id: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        created_at: i64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            message: message.into(),
            kind,
            created_at,
            read: false,
        }
    }
}
