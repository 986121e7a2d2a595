//! HandlePaymentOutcome command
//!
//! Purely reactive to the gateway's asynchronous callback, which is
//! delivered at-least-once: a reference whose transaction is already
//! terminal is acknowledged as a duplicate without touching state or
//! re-notifying the buyer.

use shared::models::{NotificationKind, OrderStatus, PaymentOutcome, PaymentStatus, PaymentTxStatus};

use super::{ActionContext, ActionOutcome};
use crate::orders::OrderEvent;
use crate::orders::manager::{OrderError, OrderResult};

pub struct PaymentOutcomeAction<'c> {
    pub reference: &'c str,
    pub outcome: PaymentOutcome,
}

impl PaymentOutcomeAction<'_> {
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        let mut payment = ctx
            .storage
            .get_payment_txn(ctx.txn, self.reference)?
            .ok_or_else(|| OrderError::PaymentNotFound(self.reference.to_string()))?;

        let mut order = ctx.load_order(&payment.order_id)?;

        // Idempotency: duplicate delivery of a settled outcome is a no-op
        if payment.status.is_terminal() {
            tracing::info!(
                reference = %self.reference,
                status = ?payment.status,
                "Duplicate payment outcome ignored"
            );
            return Ok(ActionOutcome {
                order,
                events: vec![],
                notifications: vec![],
            });
        }

        let mut events = Vec::new();
        let mut notifications = Vec::new();

        match self.outcome {
            PaymentOutcome::Succeeded => {
                payment.status = PaymentTxStatus::Completed;
                order.payment_status = PaymentStatus::Completed;
                // Payment success confirms the order unless it already moved on
                if matches!(
                    order.status,
                    OrderStatus::Processing
                        | OrderStatus::Confirmed
                        | OrderStatus::PartiallyConfirmed
                ) && order.status != OrderStatus::Confirmed
                {
                    order.status = OrderStatus::Confirmed;
                    order.is_confirmed = true;
                    order.confirmed_at = Some(ctx.now);
                    events.push(OrderEvent::StatusChanged {
                        order_id: order.order_id.clone(),
                        status: OrderStatus::Confirmed,
                    });
                }
                ctx.notify(
                    &mut notifications,
                    &order.buyer_id,
                    format!("Payment for order {} completed", order.order_number),
                    NotificationKind::PaymentUpdate,
                )?;
            }
            PaymentOutcome::Failed => {
                payment.status = PaymentTxStatus::Failed;
                // The order stays payable; the buyer may retry
                order.payment_status = PaymentStatus::Failed;
                ctx.notify(
                    &mut notifications,
                    &order.buyer_id,
                    format!(
                        "Payment for order {} failed, you can try again",
                        order.order_number
                    ),
                    NotificationKind::PaymentUpdate,
                )?;
            }
        }

        events.push(OrderEvent::PaymentStatusChanged {
            order_id: order.order_id.clone(),
            reference: self.reference.to_string(),
            status: order.payment_status,
        });

        payment.updated_at = ctx.now;
        ctx.storage.put_payment(ctx.txn, &payment)?;
        order.updated_at = ctx.now;
        ctx.storage.put_order(ctx.txn, &order)?;

        Ok(ActionOutcome {
            order,
            events,
            notifications,
        })
    }
}
