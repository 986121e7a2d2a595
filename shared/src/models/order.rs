//! Order aggregate types and status derivation
//!
//! An order holds shipping/payment metadata and an ordered set of line items,
//! each owned by exactly one farmer and decided independently. The aggregate
//! status is never set directly by a client request: it is derived from the
//! line item statuses by [`derive_order_status`], the single source of truth
//! called after every item transition.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Aggregate order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Awaiting farmer decisions
    #[default]
    Processing,
    /// Every line item accepted
    Confirmed,
    /// All items decided, at least one declined
    PartiallyConfirmed,
    /// A farmer handed the order to delivery
    Shipped,
    /// Delivery completed
    Delivered,
    /// Buyer cancelled before shipping
    Cancelled,
}

impl OrderStatus {
    /// Terminal statuses admit no further order transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether the buyer may still cancel from this status
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Self::Processing | Self::Confirmed | Self::PartiallyConfirmed
        )
    }
}

/// Payment method chosen at order creation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    CashOnDelivery,
    OnlinePayment,
}

/// Order-level payment status
///
/// Invariant: `NotApplicable` iff the payment method is Cash on Delivery
/// (until delivery completes, which forces `Completed`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    NotApplicable,
    Pending,
    Completed,
    Failed,
}

/// Line item status
///
/// Transitions exactly once from `Pending` to a terminal value, except when
/// the whole order is cancelled while the item is still pending, which forces
/// `Cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineItemStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    Cancelled,
}

impl LineItemStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Delivery leg status, overlaid on the supplier's location stream
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Assigned,
    PickupInProgress,
    PickedUp,
    InTransit,
    Delivered,
    Failed,
    Cancelled,
}

impl DeliveryStatus {
    fn rank(&self) -> Option<u8> {
        match self {
            Self::Assigned => Some(0),
            Self::PickupInProgress => Some(1),
            Self::PickedUp => Some(2),
            Self::InTransit => Some(3),
            Self::Delivered => Some(4),
            Self::Failed | Self::Cancelled => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed | Self::Cancelled)
    }

    /// Forward-or-to-terminal rule: no transition out of a terminal status,
    /// no stepping backwards along the progress chain.
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            DeliveryStatus::Failed | DeliveryStatus::Cancelled => true,
            _ => match (self.rank(), next.rank()) {
                (Some(cur), Some(nxt)) => nxt > cur,
                _ => false,
            },
        }
    }
}

/// Shipping destination captured with the order
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct ShippingInfo {
    #[validate(length(min = 1, message = "address is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "postal code is required"))]
    pub postal_code: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
}

/// One product/quantity/farmer triple within an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLineItem {
    /// Line item ID (assigned by server)
    pub item_id: String,
    pub product_id: String,
    /// Product name snapshot at order time
    pub product_name: String,
    /// Owning farmer
    pub farmer_id: String,
    pub quantity: u32,
    /// Unit price snapshot at order time
    pub price: f64,
    /// price * quantity
    pub subtotal: f64,
    pub status: LineItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub farmer_notes: Option<String>,
}

/// Delivery leg attached once a supplier claims the order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryLeg {
    pub supplier_id: String,
    pub status: DeliveryStatus,
    pub updated_at: i64,
}

/// Order aggregate
///
/// Created atomically with its line items; mutated only through the order
/// state machine; never deleted, cancellation is a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    /// Order ID (assigned by server)
    pub order_id: String,
    /// Externally unique human-readable number
    pub order_number: String,
    pub buyer_id: String,
    pub items: Vec<OrderLineItem>,
    /// Sum of line subtotals plus the flat delivery fee
    pub total_amount: f64,
    pub delivery_fee: f64,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Reference of the latest payment transaction, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub shipping: ShippingInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryLeg>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Order {
    /// Whether the given farmer owns at least one line item
    pub fn has_farmer(&self, farmer_id: &str) -> bool {
        self.items.iter().any(|i| i.farmer_id == farmer_id)
    }

    /// Whether the given supplier is assigned to this order's delivery
    pub fn has_supplier(&self, supplier_id: &str) -> bool {
        self.delivery
            .as_ref()
            .is_some_and(|d| d.supplier_id == supplier_id)
    }

    pub fn item(&self, item_id: &str) -> Option<&OrderLineItem> {
        self.items.iter().find(|i| i.item_id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut OrderLineItem> {
        self.items.iter_mut().find(|i| i.item_id == item_id)
    }

    /// Statuses of all line items, for aggregate derivation
    pub fn item_statuses(&self) -> Vec<LineItemStatus> {
        self.items.iter().map(|i| i.status).collect()
    }
}

/// Derive the aggregate order status from its items' statuses
///
/// Centralized so every call site agrees:
/// - all items Accepted → Confirmed
/// - no item Pending and at least one Declined → PartiallyConfirmed
/// - otherwise (some Pending remain) → Processing
pub fn derive_order_status(statuses: &[LineItemStatus]) -> OrderStatus {
    if statuses.iter().any(|s| *s == LineItemStatus::Pending) {
        return OrderStatus::Processing;
    }
    if statuses.iter().all(|s| *s == LineItemStatus::Accepted) {
        OrderStatus::Confirmed
    } else {
        OrderStatus::PartiallyConfirmed
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

/// One requested product/quantity pair in a create-order request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    #[validate(length(min = 1, message = "product_id is required"))]
    pub product_id: String,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: u32,
}

/// Create-order request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(
        length(min = 1, message = "order must contain at least one item"),
        nested
    )]
    pub items: Vec<OrderItemInput>,
    #[validate(nested)]
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use LineItemStatus::*;

    #[test]
    fn test_derive_all_accepted() {
        assert_eq!(
            derive_order_status(&[Accepted, Accepted, Accepted]),
            OrderStatus::Confirmed
        );
    }

    #[test]
    fn test_derive_partially_confirmed() {
        assert_eq!(
            derive_order_status(&[Accepted, Declined]),
            OrderStatus::PartiallyConfirmed
        );
        assert_eq!(
            derive_order_status(&[Declined, Declined]),
            OrderStatus::PartiallyConfirmed
        );
    }

    #[test]
    fn test_derive_pending_keeps_processing() {
        assert_eq!(
            derive_order_status(&[Accepted, Pending]),
            OrderStatus::Processing
        );
        assert_eq!(
            derive_order_status(&[Pending, Declined]),
            OrderStatus::Processing
        );
        assert_eq!(derive_order_status(&[Pending]), OrderStatus::Processing);
    }

    #[test]
    fn test_derive_exhaustive_pairs() {
        // All reachable two-item combinations of {Pending, Accepted, Declined}
        let all = [Pending, Accepted, Declined];
        for a in all {
            for b in all {
                let derived = derive_order_status(&[a, b]);
                let expect = if a == Pending || b == Pending {
                    OrderStatus::Processing
                } else if a == Accepted && b == Accepted {
                    OrderStatus::Confirmed
                } else {
                    OrderStatus::PartiallyConfirmed
                };
                assert_eq!(derived, expect, "({:?}, {:?})", a, b);
            }
        }
    }

    #[test]
    fn test_delivery_forward_only() {
        use DeliveryStatus::*;
        assert!(Assigned.can_transition_to(PickupInProgress));
        assert!(Assigned.can_transition_to(InTransit));
        assert!(PickedUp.can_transition_to(Delivered));
        assert!(InTransit.can_transition_to(Failed));
        assert!(!InTransit.can_transition_to(PickedUp));
        assert!(!Delivered.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Assigned));
        assert!(!Cancelled.can_transition_to(InTransit));
    }

    #[test]
    fn test_order_status_cancellable() {
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(OrderStatus::PartiallyConfirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::PartiallyConfirmed).unwrap();
        assert_eq!(json, "\"PARTIALLY_CONFIRMED\"");
        let json = serde_json::to_string(&PaymentStatus::NotApplicable).unwrap();
        assert_eq!(json, "\"NOT_APPLICABLE\"");
        let json = serde_json::to_string(&DeliveryStatus::PickupInProgress).unwrap();
        assert_eq!(json, "\"PICKUP_IN_PROGRESS\"");
    }
}
