//! Order commands, one file per action
//!
//! Every action executes inside one exclusive write transaction provided by
//! the manager: state reads inside an action always observe the latest
//! committed sibling transitions, and nothing an action writes (order,
//! ledger, payments, inbox records) survives unless the whole command
//! commits.

mod assign_delivery;
mod create_order;
mod initiate_payment;
mod payment_outcome;
mod update_delivery_status;
mod update_item_status;
mod update_order_status;

pub use assign_delivery::AssignDeliveryAction;
pub use create_order::CreateOrderAction;
pub use initiate_payment::{PreparedPayment, RecordPaymentAction, prepare_payment};
pub use payment_outcome::PaymentOutcomeAction;
pub use update_delivery_status::UpdateDeliveryAction;
pub use update_item_status::UpdateLineItemAction;
pub use update_order_status::UpdateOrderStatusAction;

use redb::WriteTransaction;
use shared::models::{Notification, NotificationKind, Order};
use shared::util::now_millis;

use super::OrderEvent;
use super::manager::{OrderError, OrderResult};
use super::storage::MarketStorage;

/// Execution context handed to every action
pub struct ActionContext<'a> {
    pub txn: &'a WriteTransaction,
    pub storage: &'a MarketStorage,
    pub now: i64,
}

impl<'a> ActionContext<'a> {
    pub fn new(txn: &'a WriteTransaction, storage: &'a MarketStorage) -> Self {
        Self {
            txn,
            storage,
            now: now_millis(),
        }
    }

    /// Load an order inside the transaction
    pub fn load_order(&self, order_id: &str) -> OrderResult<Order> {
        self.storage
            .get_order_txn(self.txn, order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))
    }

    /// Write a durable inbox record and collect it for the post-commit push
    pub fn notify(
        &self,
        sink: &mut Vec<Notification>,
        user_id: &str,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> OrderResult<()> {
        let notification = Notification::new(user_id, message, kind, self.now);
        self.storage.push_notification(self.txn, &notification)?;
        sink.push(notification);
        Ok(())
    }
}

/// Result of a successfully executed action
///
/// `events` are broadcast and `notifications` live-pushed only after the
/// transaction commits.
pub struct ActionOutcome {
    pub order: Order,
    pub events: Vec<OrderEvent>,
    pub notifications: Vec<Notification>,
}
