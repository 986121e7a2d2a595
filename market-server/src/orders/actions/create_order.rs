//! CreateOrder command
//!
//! Builds the whole aggregate in one transaction: product lookups, stock
//! reservations, totals, the unique order number, the order record, and the
//! buyer/farmer inbox notifications. Any failure aborts everything.

use std::collections::BTreeSet;

use shared::models::{
    CreateOrderRequest, LineItemStatus, NotificationKind, Order, OrderLineItem, OrderStatus,
    PaymentMethod, PaymentStatus,
};

use super::{ActionContext, ActionOutcome};
use crate::orders::OrderEvent;
use crate::orders::manager::{OrderError, OrderResult};
use crate::orders::money;
use crate::services::Catalog;

/// Maximum quantity of one product per line item
const MAX_ITEM_QUANTITY: u32 = 10_000;

pub struct CreateOrderAction<'c> {
    pub buyer_id: &'c str,
    pub request: &'c CreateOrderRequest,
    pub delivery_fee: f64,
    pub catalog: &'c dyn Catalog,
}

impl CreateOrderAction<'_> {
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        // 1. Resolve products, reserve stock, build line items
        let mut items: Vec<OrderLineItem> = Vec::with_capacity(self.request.items.len());
        let mut farmer_ids: BTreeSet<String> = BTreeSet::new();

        for input in &self.request.items {
            if input.quantity == 0 || input.quantity > MAX_ITEM_QUANTITY {
                return Err(OrderError::Validation(format!(
                    "Invalid quantity {} for product {}",
                    input.quantity, input.product_id
                )));
            }

            let meta = self
                .catalog
                .product_meta(&input.product_id)
                .ok_or_else(|| OrderError::ProductNotFound(input.product_id.clone()))?;

            if !self.catalog.is_farmer(&meta.farmer_id) {
                return Err(OrderError::Validation(format!(
                    "Product {} is not offered by a farmer",
                    meta.id
                )));
            }

            if !money::is_valid_amount(meta.price) {
                return Err(OrderError::Validation(format!(
                    "Product {} has an invalid price",
                    meta.id
                )));
            }

            let qty = u64::from(input.quantity);
            if !ctx.storage.ledger_reserve(ctx.txn, &meta.id, qty)? {
                let available = ctx.storage.ledger_available_txn(ctx.txn, &meta.id)?;
                return Err(OrderError::InsufficientStock {
                    product_id: meta.id,
                    requested: qty,
                    available,
                });
            }

            farmer_ids.insert(meta.farmer_id.clone());
            items.push(OrderLineItem {
                item_id: uuid::Uuid::new_v4().to_string(),
                product_id: meta.id,
                product_name: meta.name,
                farmer_id: meta.farmer_id,
                quantity: input.quantity,
                price: meta.price,
                subtotal: money::line_subtotal(meta.price, input.quantity),
                status: LineItemStatus::Pending,
                status_updated_at: None,
                farmer_notes: None,
            });
        }

        // 2. Totals: sum of line subtotals plus the flat delivery fee
        let items_total = money::sum(items.iter().map(|i| i.subtotal));
        let total_amount = money::sum([items_total, self.delivery_fee]);

        // 3. Unique order number; collision regenerates
        let order_id = uuid::Uuid::new_v4().to_string();
        let order_number = self.claim_order_number(ctx, &order_id)?;

        // 4. Payment status follows the payment method
        let payment_status = match self.request.payment_method {
            PaymentMethod::CashOnDelivery => PaymentStatus::NotApplicable,
            PaymentMethod::OnlinePayment => PaymentStatus::Pending,
        };

        let order = Order {
            order_id: order_id.clone(),
            order_number: order_number.clone(),
            buyer_id: self.buyer_id.to_string(),
            items,
            total_amount,
            delivery_fee: self.delivery_fee,
            status: OrderStatus::Processing,
            payment_method: self.request.payment_method,
            payment_status,
            payment_reference: None,
            shipping: self.request.shipping.clone(),
            notes: self.request.notes.clone(),
            is_confirmed: false,
            confirmed_at: None,
            delivery: None,
            created_at: ctx.now,
            updated_at: ctx.now,
        };
        ctx.storage.put_order(ctx.txn, &order)?;

        // 5. One notification to the buyer and one per distinct farmer
        let mut notifications = Vec::new();
        ctx.notify(
            &mut notifications,
            self.buyer_id,
            format!("Order {} placed, awaiting farmer review", order_number),
            NotificationKind::OrderPlaced,
        )?;
        for farmer_id in &farmer_ids {
            ctx.notify(
                &mut notifications,
                farmer_id,
                format!("Order {} contains items awaiting your review", order_number),
                NotificationKind::OrderPlaced,
            )?;
        }

        Ok(ActionOutcome {
            events: vec![OrderEvent::Created {
                order_id,
                buyer_id: self.buyer_id.to_string(),
            }],
            notifications,
            order,
        })
    }

    fn claim_order_number(&self, ctx: &ActionContext<'_>, order_id: &str) -> OrderResult<String> {
        for _ in 0..16 {
            let candidate = generate_order_number(ctx.now);
            if ctx
                .storage
                .claim_order_number(ctx.txn, &candidate, order_id)?
            {
                return Ok(candidate);
            }
        }
        Err(OrderError::Internal(
            "Could not allocate a unique order number".to_string(),
        ))
    }
}

/// Order number: prefix + timestamp suffix + random suffix
fn generate_order_number(now: i64) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("FH{}{}", now, &suffix[..6].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_shape() {
        let number = generate_order_number(1_700_000_000_000);
        assert!(number.starts_with("FH1700000000000"));
        assert_eq!(number.len(), "FH1700000000000".len() + 6);
    }
}
