//! OrdersManager - Command execution for the order state machine
//!
//! # Command flow
//!
//! ```text
//! handler call
//!     ├─ 1. Validate the request
//!     ├─ 2. Begin write transaction (exclusive)
//!     ├─ 3. Execute the action (reads + writes, inbox records included)
//!     ├─ 4. Commit (abort on any error, leaving nothing behind)
//!     ├─ 5. Broadcast domain event(s)
//!     ├─ 6. Live-push notifications (fire-and-forget)
//!     └─ 7. Return the updated order
//! ```
//!
//! The single-writer transaction is what delivers the consistency story:
//! inventory floor checks cannot race, and the aggregate recompute inside a
//! transaction always observes sibling transitions that committed before it.

mod error;
pub use error::*;

use std::sync::Arc;

use tokio::sync::broadcast;
use validator::Validate;

use shared::models::{
    CreateOrderRequest, DeliveryStatus, LineItemStatus, Notification, Order, OrderStatus,
    PaymentOutcome, UserRole,
};
use shared::message::ServerMessage;

use super::OrderEvent;
use super::actions::{
    ActionContext, ActionOutcome, AssignDeliveryAction, CreateOrderAction, PaymentOutcomeAction,
    RecordPaymentAction, UpdateDeliveryAction, UpdateLineItemAction, UpdateOrderStatusAction,
    prepare_payment,
};
use super::storage::{MarketStorage, StorageError};
use crate::notify::LivePush;
use crate::payment::PaymentGateway;
use crate::services::Catalog;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 4096;

/// Order state machine entry point
pub struct OrdersManager {
    storage: MarketStorage,
    catalog: Arc<dyn Catalog>,
    gateway: Arc<dyn PaymentGateway>,
    push: Arc<dyn LivePush>,
    event_tx: broadcast::Sender<OrderEvent>,
    delivery_fee: f64,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("storage", &"<MarketStorage>")
            .field("event_tx", &"<broadcast::Sender>")
            .field("delivery_fee", &self.delivery_fee)
            .finish()
    }
}

impl OrdersManager {
    pub fn new(
        storage: MarketStorage,
        catalog: Arc<dyn Catalog>,
        gateway: Arc<dyn PaymentGateway>,
        push: Arc<dyn LivePush>,
        delivery_fee: f64,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            storage,
            catalog,
            gateway,
            push,
            event_tx,
            delivery_fee,
        }
    }

    /// Subscribe to domain event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.event_tx.subscribe()
    }

    /// Get the underlying storage
    pub fn storage(&self) -> &MarketStorage {
        &self.storage
    }

    pub fn delivery_fee(&self) -> f64 {
        self.delivery_fee
    }

    // ========== Commands ==========

    /// Create an order atomically: reservations, totals, order number,
    /// notifications, all or nothing.
    pub fn create_order(&self, buyer_id: &str, request: &CreateOrderRequest) -> OrderResult<Order> {
        request
            .validate()
            .map_err(|e| OrderError::Validation(e.to_string()))?;

        let txn = self.storage.begin_write()?;
        let outcome = CreateOrderAction {
            buyer_id,
            request,
            delivery_fee: self.delivery_fee,
            catalog: self.catalog.as_ref(),
        }
        .execute(&ActionContext::new(&txn, &self.storage))?;
        self.commit_and_finish(txn, outcome)
    }

    /// Farmer accepts or declines one pending line item
    pub fn update_line_item(
        &self,
        order_id: &str,
        item_id: &str,
        farmer_id: &str,
        decision: LineItemStatus,
        notes: Option<String>,
    ) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let outcome = UpdateLineItemAction {
            order_id,
            item_id,
            farmer_id,
            decision,
            notes,
        }
        .execute(&ActionContext::new(&txn, &self.storage))?;
        self.commit_and_finish(txn, outcome)
    }

    /// Role-gated order status transition (farmer → Shipped, buyer → Cancelled)
    pub fn update_order_status(
        &self,
        order_id: &str,
        caller_id: &str,
        role: UserRole,
        target: OrderStatus,
    ) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let outcome = UpdateOrderStatusAction {
            order_id,
            caller_id,
            role,
            target,
        }
        .execute(&ActionContext::new(&txn, &self.storage))?;
        self.commit_and_finish(txn, outcome)
    }

    /// Supplier claims a confirmed order's delivery
    pub fn claim_delivery(&self, order_id: &str, supplier_id: &str) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let outcome = AssignDeliveryAction {
            order_id,
            supplier_id,
        }
        .execute(&ActionContext::new(&txn, &self.storage))?;
        self.commit_and_finish(txn, outcome)
    }

    /// Assigned supplier advances the delivery leg
    pub fn update_delivery_status(
        &self,
        order_id: &str,
        supplier_id: &str,
        target: DeliveryStatus,
    ) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let outcome = UpdateDeliveryAction {
            order_id,
            supplier_id,
            target,
        }
        .execute(&ActionContext::new(&txn, &self.storage))?;
        self.commit_and_finish(txn, outcome)
    }

    /// Initiate the online payment and return the gateway redirect URL
    ///
    /// The gateway call happens outside any storage transaction; a gateway
    /// failure surfaces as an external error with no local state change.
    pub async fn initiate_payment(&self, order_id: &str, buyer_id: &str) -> OrderResult<String> {
        let prepared = prepare_payment(&self.storage, order_id, buyer_id)?;
        let initiated = self
            .gateway
            .initiate(prepared.amount, &prepared.reference)
            .await?;

        let txn = self.storage.begin_write()?;
        let outcome = RecordPaymentAction {
            prepared: &prepared,
            buyer_id,
        }
        .execute(&ActionContext::new(&txn, &self.storage))?;
        self.commit_and_finish(txn, outcome)?;

        tracing::info!(
            order_id = %order_id,
            reference = %prepared.reference,
            amount = prepared.amount,
            "Payment initiated"
        );
        Ok(initiated.redirect_url)
    }

    /// Record the gateway's asynchronous outcome (at-least-once delivery)
    pub fn handle_payment_outcome(
        &self,
        reference: &str,
        outcome: PaymentOutcome,
    ) -> OrderResult<Order> {
        let txn = self.storage.begin_write()?;
        let result = PaymentOutcomeAction { reference, outcome }
            .execute(&ActionContext::new(&txn, &self.storage))?;
        self.commit_and_finish(txn, result)
    }

    /// Add stock to the ledger (initial seeding and restock)
    pub fn restock(&self, product_id: &str, qty: u64) -> OrderResult<u64> {
        let txn = self.storage.begin_write()?;
        self.storage.ledger_release(&txn, product_id, qty)?;
        let available = self.storage.ledger_available_txn(&txn, product_id)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(available)
    }

    // ========== Queries ==========

    /// Available stock for a product
    pub fn available_stock(&self, product_id: &str) -> OrderResult<u64> {
        Ok(self.storage.ledger_available(product_id)?)
    }

    /// Role-filtered order listing
    ///
    /// Buyers see their own orders; farmers see orders containing their line
    /// items; suppliers see orders assigned to them plus confirmed orders
    /// still waiting for a delivery claim.
    pub fn list_orders_for(&self, user_id: &str, role: UserRole) -> OrderResult<Vec<Order>> {
        let orders = self.storage.list_orders()?;
        let filtered = orders
            .into_iter()
            .filter(|order| match role {
                UserRole::Buyer => order.buyer_id == user_id,
                UserRole::Farmer => order.has_farmer(user_id),
                UserRole::Supplier => order.has_supplier(user_id) || Self::claimable(order),
            })
            .collect();
        Ok(filtered)
    }

    /// Permission-checked order fetch
    pub fn get_order_for(
        &self,
        order_id: &str,
        user_id: &str,
        role: UserRole,
    ) -> OrderResult<Order> {
        let order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

        let allowed = match role {
            UserRole::Buyer => order.buyer_id == user_id,
            UserRole::Farmer => order.has_farmer(user_id),
            UserRole::Supplier => order.has_supplier(user_id) || Self::claimable(&order),
        };
        if !allowed {
            return Err(OrderError::PermissionDenied(
                "You are not a party to this order".to_string(),
            ));
        }
        Ok(order)
    }

    /// The caller's notification inbox, newest first
    pub fn notifications_for(&self, user_id: &str) -> OrderResult<Vec<Notification>> {
        Ok(self.storage.notifications_for_user(user_id)?)
    }

    fn claimable(order: &Order) -> bool {
        matches!(
            order.status,
            OrderStatus::Confirmed | OrderStatus::PartiallyConfirmed | OrderStatus::Shipped
        ) && order
            .delivery
            .as_ref()
            .is_none_or(|d| d.status.is_terminal())
    }

    // ========== Post-commit ==========

    fn commit_and_finish(
        &self,
        txn: redb::WriteTransaction,
        outcome: ActionOutcome,
    ) -> OrderResult<Order> {
        txn.commit().map_err(StorageError::from)?;

        // Live push is best-effort and must never fail the committed command
        for notification in &outcome.notifications {
            self.push.push(
                &notification.user_id,
                ServerMessage::Notification {
                    message: notification.message.clone(),
                    kind: notification.kind,
                },
            );
        }

        for event in outcome.events {
            if self.event_tx.send(event).is_err() {
                tracing::debug!("No active receivers for order events");
                break;
            }
        }

        Ok(outcome.order)
    }
}

#[cfg(test)]
mod tests;
