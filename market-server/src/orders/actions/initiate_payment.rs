//! InitiatePayment command
//!
//! Two phases, because the gateway call is external I/O that must not run
//! inside the storage transaction:
//!
//! 1. `prepare_payment` validates preconditions against committed state and
//!    computes the charge: the sum of ACCEPTED items' subtotals only. The
//!    buyer is never charged for declined lines, and the flat delivery fee
//!    is settled with the delivery leg, not the online charge.
//! 2. After the gateway accepted, `RecordPaymentAction` re-validates inside
//!    a write transaction and persists the Pending transaction. A gateway
//!    failure therefore leaves no local state at all.

use shared::models::{
    LineItemStatus, Order, PaymentMethod, PaymentStatus, PaymentTransaction, PaymentTxStatus,
};

use super::{ActionContext, ActionOutcome};
use crate::orders::manager::{OrderError, OrderResult};
use crate::orders::money;
use crate::orders::storage::MarketStorage;

/// Validated charge, ready to hand to the gateway
#[derive(Debug, Clone)]
pub struct PreparedPayment {
    pub order_id: String,
    pub reference: String,
    pub amount: f64,
}

/// Phase 1: validate preconditions and compute the charge (no writes)
pub fn prepare_payment(
    storage: &MarketStorage,
    order_id: &str,
    buyer_id: &str,
) -> OrderResult<PreparedPayment> {
    let order = storage
        .get_order(order_id)?
        .ok_or_else(|| OrderError::OrderNotFound(order_id.to_string()))?;

    let amount = validate_payable(&order, buyer_id, |reference| storage.get_payment(reference))?;

    // Reference derived from the order number, unique per attempt
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let reference = format!("{}-{}", order.order_number, &suffix[..8]);

    Ok(PreparedPayment {
        order_id: order.order_id,
        reference,
        amount,
    })
}

/// Shared precondition checks; returns the chargeable amount
fn validate_payable(
    order: &Order,
    buyer_id: &str,
    load_payment: impl Fn(&str) -> Result<Option<PaymentTransaction>, crate::orders::StorageError>,
) -> OrderResult<f64> {
    if order.buyer_id != buyer_id {
        return Err(OrderError::PermissionDenied(
            "Only the buyer may pay for this order".to_string(),
        ));
    }
    if order.payment_method != PaymentMethod::OnlinePayment {
        return Err(OrderError::NotPayable(
            "Order is payable on delivery, not online".to_string(),
        ));
    }
    // Failed outcomes leave the order payable again
    if !matches!(
        order.payment_status,
        PaymentStatus::Pending | PaymentStatus::Failed
    ) {
        return Err(OrderError::NotPayable(format!(
            "Payment is already {:?}",
            order.payment_status
        )));
    }
    if order
        .items
        .iter()
        .any(|i| i.status == LineItemStatus::Pending)
    {
        return Err(OrderError::NotPayable(
            "Line items are still awaiting farmer review".to_string(),
        ));
    }

    let accepted: Vec<f64> = order
        .items
        .iter()
        .filter(|i| i.status == LineItemStatus::Accepted)
        .map(|i| i.subtotal)
        .collect();
    if accepted.is_empty() {
        return Err(OrderError::NotPayable(
            "No accepted items to charge".to_string(),
        ));
    }

    // At most one non-terminal payment transaction per order
    if let Some(reference) = order.payment_reference.as_deref()
        && let Some(existing) = load_payment(reference)?
        && !existing.status.is_terminal()
    {
        return Err(OrderError::NotPayable(
            "A payment for this order is already in flight".to_string(),
        ));
    }

    Ok(money::sum(accepted))
}

/// Phase 2: persist the Pending transaction after the gateway accepted
pub struct RecordPaymentAction<'c> {
    pub prepared: &'c PreparedPayment,
    pub buyer_id: &'c str,
}

impl RecordPaymentAction<'_> {
    pub fn execute(&self, ctx: &ActionContext<'_>) -> OrderResult<ActionOutcome> {
        let mut order = ctx.load_order(&self.prepared.order_id)?;

        // State may have moved while the gateway was being called
        let amount = validate_payable(&order, self.buyer_id, |reference| {
            ctx.storage.get_payment_txn(ctx.txn, reference)
        })?;
        if (amount - self.prepared.amount).abs() > f64::EPSILON {
            return Err(OrderError::NotPayable(
                "Order items changed while the payment was being initiated".to_string(),
            ));
        }

        let payment = PaymentTransaction {
            reference: self.prepared.reference.clone(),
            order_id: order.order_id.clone(),
            amount,
            status: PaymentTxStatus::Pending,
            created_at: ctx.now,
            updated_at: ctx.now,
        };
        ctx.storage.put_payment(ctx.txn, &payment)?;

        order.payment_reference = Some(payment.reference.clone());
        order.payment_status = PaymentStatus::Pending;
        order.updated_at = ctx.now;
        ctx.storage.put_order(ctx.txn, &order)?;

        Ok(ActionOutcome {
            order,
            events: vec![],
            notifications: vec![],
        })
    }
}
