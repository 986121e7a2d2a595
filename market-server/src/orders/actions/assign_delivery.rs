//! AssignDelivery command
//!
//! A supplier claims a confirmed order that has no active delivery. A
//! previous Failed/Cancelled delivery leg does not block a new claim.

use shared::models::{DeliveryLeg, DeliveryStatus, NotificationKind, OrderStatus};

use super::{ActionContext, ActionOutcome};
use crate::orders::OrderEvent;
use crate::orders::manager::{OrderError, OrderResult};

pub struct AssignDeliveryAction<'c> {
    pub order_id: &'c str,
    pub supplier_id: &'c str,
}

impl AssignDeliveryAction<'_> {
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        let mut order = ctx.load_order(self.order_id)?;

        if !matches!(
            order.status,
            OrderStatus::Confirmed | OrderStatus::PartiallyConfirmed | OrderStatus::Shipped
        ) {
            return Err(OrderError::InvalidTransition(format!(
                "Order {} is {:?} and not ready for delivery",
                self.order_id, order.status
            )));
        }

        if let Some(existing) = &order.delivery
            && !existing.status.is_terminal()
        {
            return Err(OrderError::DeliveryAlreadyAssigned(
                self.order_id.to_string(),
            ));
        }

        order.delivery = Some(DeliveryLeg {
            supplier_id: self.supplier_id.to_string(),
            status: DeliveryStatus::Assigned,
            updated_at: ctx.now,
        });
        order.updated_at = ctx.now;
        ctx.storage.put_order(ctx.txn, &order)?;

        let mut notifications = Vec::new();
        ctx.notify(
            &mut notifications,
            &order.buyer_id,
            format!(
                "A delivery partner was assigned to order {}",
                order.order_number
            ),
            NotificationKind::DeliveryUpdate,
        )?;

        Ok(ActionOutcome {
            events: vec![OrderEvent::DeliveryAssigned {
                order_id: order.order_id.clone(),
                supplier_id: self.supplier_id.to_string(),
            }],
            notifications,
            order,
        })
    }
}
