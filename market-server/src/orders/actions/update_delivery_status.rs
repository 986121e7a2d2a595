//! UpdateDeliveryStatus command
//!
//! The assigned supplier walks the delivery leg forward:
//! Assigned → PickupInProgress → PickedUp → InTransit → Delivered, with
//! Failed/Cancelled as alternate terminals. No transition leaves a terminal
//! status and none steps backwards. Delivered also completes the order and,
//! for cash on delivery, forces the payment status to Completed.

use shared::models::{DeliveryStatus, NotificationKind, OrderStatus, PaymentMethod, PaymentStatus};

use super::{ActionContext, ActionOutcome};
use crate::orders::OrderEvent;
use crate::orders::manager::{OrderError, OrderResult};

pub struct UpdateDeliveryAction<'c> {
    pub order_id: &'c str,
    pub supplier_id: &'c str,
    pub target: DeliveryStatus,
}

impl UpdateDeliveryAction<'_> {
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        let mut order = ctx.load_order(self.order_id)?;

        let delivery = order.delivery.as_mut().ok_or_else(|| {
            OrderError::InvalidTransition(format!(
                "Order {} has no delivery assigned",
                self.order_id
            ))
        })?;

        if delivery.supplier_id != self.supplier_id {
            return Err(OrderError::PermissionDenied(
                "This delivery belongs to another supplier".to_string(),
            ));
        }
        if !delivery.status.can_transition_to(self.target) {
            return Err(OrderError::InvalidTransition(format!(
                "Delivery cannot move from {:?} to {:?}",
                delivery.status, self.target
            )));
        }
        if self.target == DeliveryStatus::Delivered && order.status != OrderStatus::Shipped {
            return Err(OrderError::InvalidTransition(format!(
                "Order {} has not been shipped yet",
                self.order_id
            )));
        }

        delivery.status = self.target;
        delivery.updated_at = ctx.now;

        let mut events = vec![OrderEvent::DeliveryStatusChanged {
            order_id: order.order_id.clone(),
            supplier_id: self.supplier_id.to_string(),
            status: self.target,
        }];

        let mut notifications = Vec::new();
        if self.target == DeliveryStatus::Delivered {
            order.status = OrderStatus::Delivered;
            if order.payment_method == PaymentMethod::CashOnDelivery {
                order.payment_status = PaymentStatus::Completed;
            }
            events.push(OrderEvent::StatusChanged {
                order_id: order.order_id.clone(),
                status: OrderStatus::Delivered,
            });
            ctx.notify(
                &mut notifications,
                &order.buyer_id,
                format!("Order {} was delivered", order.order_number),
                NotificationKind::DeliveryUpdate,
            )?;
        } else {
            ctx.notify(
                &mut notifications,
                &order.buyer_id,
                format!(
                    "Delivery update for order {}: {:?}",
                    order.order_number, self.target
                ),
                NotificationKind::DeliveryUpdate,
            )?;
        }

        order.updated_at = ctx.now;
        ctx.storage.put_order(ctx.txn, &order)?;

        Ok(ActionOutcome {
            order,
            events,
            notifications,
        })
    }
}
