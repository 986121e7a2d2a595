//! UpdateLineItemStatus command
//!
//! A farmer accepts or declines one of their pending line items. Declining
//! releases the reservation. The aggregate status is recomputed from ALL
//! sibling items re-read inside this transaction, so concurrent farmer
//! decisions never lose each other's committed result.

use shared::models::{LineItemStatus, NotificationKind, OrderStatus, derive_order_status};

use super::{ActionContext, ActionOutcome};
use crate::orders::OrderEvent;
use crate::orders::manager::{OrderError, OrderResult};

pub struct UpdateLineItemAction<'c> {
    pub order_id: &'c str,
    pub item_id: &'c str,
    pub farmer_id: &'c str,
    pub decision: LineItemStatus,
    pub notes: Option<String>,
}

impl UpdateLineItemAction<'_> {
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        if !matches!(
            self.decision,
            LineItemStatus::Accepted | LineItemStatus::Declined
        ) {
            return Err(OrderError::Validation(format!(
                "A line item can only be accepted or declined, not {:?}",
                self.decision
            )));
        }

        let mut order = ctx.load_order(self.order_id)?;
        if order.status.is_terminal() {
            return Err(OrderError::InvalidTransition(format!(
                "Order {} is {:?} and accepts no further decisions",
                self.order_id, order.status
            )));
        }

        let item = order
            .item_mut(self.item_id)
            .ok_or_else(|| OrderError::ItemNotFound(self.item_id.to_string()))?;

        if item.farmer_id != self.farmer_id {
            return Err(OrderError::PermissionDenied(
                "Only the owning farmer may decide this line item".to_string(),
            ));
        }
        // Re-deciding a terminal item is a conflict, not a silent no-op
        if item.status != LineItemStatus::Pending {
            return Err(OrderError::ItemAlreadyDecided(self.item_id.to_string()));
        }

        item.status = self.decision;
        item.status_updated_at = Some(ctx.now);
        item.farmer_notes = self.notes.clone();

        let product_id = item.product_id.clone();
        let product_name = item.product_name.clone();
        let quantity = u64::from(item.quantity);

        // Declined items give their reservation back immediately
        if self.decision == LineItemStatus::Declined {
            ctx.storage.ledger_release(ctx.txn, &product_id, quantity)?;
        }

        let mut events = vec![OrderEvent::ItemDecided {
            order_id: order.order_id.clone(),
            item_id: self.item_id.to_string(),
            farmer_id: self.farmer_id.to_string(),
            status: self.decision,
        }];

        // Aggregate recomputation over the freshly read sibling statuses
        let derived = derive_order_status(&order.item_statuses());
        let settled = derived != OrderStatus::Processing;
        if derived != order.status {
            order.status = derived;
            if derived == OrderStatus::Confirmed {
                order.is_confirmed = true;
                order.confirmed_at = Some(ctx.now);
            }
            events.push(OrderEvent::StatusChanged {
                order_id: order.order_id.clone(),
                status: derived,
            });
        }

        order.updated_at = ctx.now;
        ctx.storage.put_order(ctx.txn, &order)?;

        let mut notifications = Vec::new();
        let verdict = match self.decision {
            LineItemStatus::Accepted => "accepted",
            _ => "declined",
        };
        ctx.notify(
            &mut notifications,
            &order.buyer_id,
            format!(
                "{} x{} was {} for order {}",
                product_name, quantity, verdict, order.order_number
            ),
            NotificationKind::ItemDecision,
        )?;
        if settled {
            ctx.notify(
                &mut notifications,
                &order.buyer_id,
                format!(
                    "All items of order {} are reviewed: {:?}",
                    order.order_number, order.status
                ),
                NotificationKind::OrderUpdate,
            )?;
        }

        Ok(ActionOutcome {
            order,
            events,
            notifications,
        })
    }
}
