//! UpdateOrderStatus command
//!
//! Role-gated transition table:
//! - a farmer owning at least one line item may mark the order Shipped
//! - the buyer may cancel before shipping
//!
//! Any other (role, target-status) pair is rejected as forbidden, not as a
//! generic validation error, so clients and audit can tell "who may not"
//! from "may not right now". Delivered is reachable only through the
//! delivery leg.

use std::collections::BTreeSet;

use shared::models::{LineItemStatus, NotificationKind, OrderStatus, UserRole};

use super::{ActionContext, ActionOutcome};
use crate::orders::OrderEvent;
use crate::orders::manager::{OrderError, OrderResult};

pub struct UpdateOrderStatusAction<'c> {
    pub order_id: &'c str,
    pub caller_id: &'c str,
    pub role: UserRole,
    pub target: OrderStatus,
}

impl UpdateOrderStatusAction<'_> {
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        match (self.role, self.target) {
            (UserRole::Farmer, OrderStatus::Shipped) => self.ship(ctx),
            (UserRole::Buyer, OrderStatus::Cancelled) => self.cancel(ctx),
            _ => Err(OrderError::ForbiddenTransition {
                role: self.role,
                target: self.target,
            }),
        }
    }

    fn ship(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        let mut order = ctx.load_order(self.order_id)?;

        if !order.has_farmer(self.caller_id) {
            return Err(OrderError::PermissionDenied(
                "No line items of this order belong to you".to_string(),
            ));
        }
        if !matches!(
            order.status,
            OrderStatus::Confirmed | OrderStatus::PartiallyConfirmed
        ) {
            return Err(OrderError::InvalidTransition(format!(
                "Order {} cannot be shipped from {:?}",
                self.order_id, order.status
            )));
        }

        order.status = OrderStatus::Shipped;
        order.updated_at = ctx.now;
        ctx.storage.put_order(ctx.txn, &order)?;

        let mut notifications = Vec::new();
        ctx.notify(
            &mut notifications,
            &order.buyer_id,
            format!("Order {} has been shipped", order.order_number),
            NotificationKind::OrderUpdate,
        )?;

        Ok(ActionOutcome {
            events: vec![OrderEvent::StatusChanged {
                order_id: order.order_id.clone(),
                status: OrderStatus::Shipped,
            }],
            notifications,
            order,
        })
    }

    fn cancel(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        let mut order = ctx.load_order(self.order_id)?;

        if order.buyer_id != self.caller_id {
            return Err(OrderError::PermissionDenied(
                "Only the buyer may cancel this order".to_string(),
            ));
        }
        if !order.status.is_cancellable() {
            return Err(OrderError::NotCancellable(format!(
                "Order {} is {:?} and can no longer be cancelled",
                self.order_id, order.status
            )));
        }
        // Cancellation while an online payment is in flight would orphan the
        // charge; the buyer must wait for the gateway outcome first.
        if let Some(reference) = order.payment_reference.as_deref()
            && let Some(payment) = ctx.storage.get_payment_txn(ctx.txn, reference)?
            && !payment.status.is_terminal()
        {
            return Err(OrderError::NotCancellable(format!(
                "Order {} has a payment awaiting its outcome",
                self.order_id
            )));
        }

        // Give back every reservation still held (declined items already
        // released theirs) and close out pending items.
        for item in &mut order.items {
            match item.status {
                LineItemStatus::Declined | LineItemStatus::Cancelled => {}
                _ => {
                    ctx.storage
                        .ledger_release(ctx.txn, &item.product_id, u64::from(item.quantity))?;
                }
            }
            if item.status == LineItemStatus::Pending {
                item.status = LineItemStatus::Cancelled;
                item.status_updated_at = Some(ctx.now);
            }
        }

        order.status = OrderStatus::Cancelled;
        order.updated_at = ctx.now;
        ctx.storage.put_order(ctx.txn, &order)?;

        let farmer_ids: BTreeSet<&str> =
            order.items.iter().map(|i| i.farmer_id.as_str()).collect();
        let mut notifications = Vec::new();
        for farmer_id in farmer_ids {
            ctx.notify(
                &mut notifications,
                farmer_id,
                format!("Order {} was cancelled by the buyer", order.order_number),
                NotificationKind::OrderUpdate,
            )?;
        }

        Ok(ActionOutcome {
            events: vec![OrderEvent::StatusChanged {
                order_id: order.order_id.clone(),
                status: OrderStatus::Cancelled,
            }],
            notifications,
            order,
        })
    }
}
