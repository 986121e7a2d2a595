//! Order state machine
//!
//! Multi-party order processing: one buyer, one line item per farmer decision,
//! at most one delivery supplier. Every mutation runs inside a single redb
//! write transaction (order write + inventory reservation + inbox records
//! commit together or not at all), then broadcasts domain events for the
//! tracking overlay and pushes best-effort live notifications.
//!
//! ```text
//! API handler ──► OrdersManager ──► action (one write txn) ──► commit
//!                        │
//!                        ├── broadcast OrderEvent ──► tracking overlay
//!                        └── LivePush (fire-and-forget, post-commit)
//! ```

pub mod actions;
pub mod manager;
pub mod money;
pub mod storage;

pub use manager::{OrderError, OrderResult, OrdersManager};
pub use storage::{MarketStorage, StorageError, StorageResult};

use shared::models::{DeliveryStatus, LineItemStatus, OrderStatus, PaymentStatus};

/// Domain events broadcast after each committed transition
///
/// Consumers must treat these as notifications to re-read state, not as a
/// replayable event source: the committed order record is authoritative.
#[derive(Debug, Clone)]
pub enum OrderEvent {
    Created {
        order_id: String,
        buyer_id: String,
    },
    ItemDecided {
        order_id: String,
        item_id: String,
        farmer_id: String,
        status: LineItemStatus,
    },
    StatusChanged {
        order_id: String,
        status: OrderStatus,
    },
    PaymentStatusChanged {
        order_id: String,
        reference: String,
        status: PaymentStatus,
    },
    DeliveryAssigned {
        order_id: String,
        supplier_id: String,
    },
    DeliveryStatusChanged {
        order_id: String,
        supplier_id: String,
        status: DeliveryStatus,
    },
}
