use super::*;

use shared::models::{
    DeliveryStatus, LineItemStatus, OrderStatus, PaymentMethod, PaymentOutcome, PaymentStatus,
    PaymentTxStatus, UserRole,
};

// ========================================================================
// Farmer decisions and aggregate derivation
// ========================================================================

#[test]
fn test_single_decision_keeps_processing() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);

    let updated = decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    assert_eq!(updated.status, OrderStatus::Processing);
    assert!(!updated.is_confirmed);
}

#[test]
fn test_all_accepted_confirms() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);

    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    let updated = decide(&manager, &order, "p2", "f2", LineItemStatus::Accepted).unwrap();

    assert_eq!(updated.status, OrderStatus::Confirmed);
    assert!(updated.is_confirmed);
    assert!(updated.confirmed_at.is_some());
}

#[test]
fn test_decline_restores_stock_and_partially_confirms() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    assert_eq!(manager.available_stock("p2").unwrap(), 7);

    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    let updated = manager
        .update_line_item(
            &order.order_id,
            &item_id_for(&order, "p2"),
            "f2",
            LineItemStatus::Declined,
            Some("Out of season".to_string()),
        )
        .unwrap();

    assert_eq!(updated.status, OrderStatus::PartiallyConfirmed);
    assert!(!updated.is_confirmed);

    let declined = updated.item(&item_id_for(&order, "p2")).unwrap();
    assert_eq!(declined.status, LineItemStatus::Declined);
    assert_eq!(declined.farmer_notes.as_deref(), Some("Out of season"));
    assert!(declined.status_updated_at.is_some());

    // The declined quantity went back to the ledger
    assert_eq!(manager.available_stock("p2").unwrap(), 10);
    // Accepted reservation is still held
    assert_eq!(manager.available_stock("p1").unwrap(), 8);
}

#[test]
fn test_all_declined_is_partially_confirmed() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);

    decide(&manager, &order, "p1", "f1", LineItemStatus::Declined).unwrap();
    let updated = decide(&manager, &order, "p2", "f2", LineItemStatus::Declined).unwrap();

    assert_eq!(updated.status, OrderStatus::PartiallyConfirmed);
    assert_eq!(manager.available_stock("p1").unwrap(), 10);
    assert_eq!(manager.available_stock("p2").unwrap(), 10);
}

#[test]
fn test_buyer_notified_per_decision() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    let before = inbox(&manager, "buyer-1").len();

    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    assert_eq!(inbox(&manager, "buyer-1").len(), before + 1);

    // The settling decision also carries the final-status notification
    decide(&manager, &order, "p2", "f2", LineItemStatus::Declined).unwrap();
    assert_eq!(inbox(&manager, "buyer-1").len(), before + 3);
}

// ========================================================================
// Online payment
// ========================================================================

/// Worked example: F1 $10x2 accepted, F2 $5x3 declined, fee 50 →
/// total 85, charge 20 (accepted subtotals only)
#[tokio::test]
async fn test_initiate_payment_charges_accepted_only() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    assert_eq!(order.total_amount, 85.0);

    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Declined).unwrap();

    let redirect = manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap();
    assert!(redirect.contains("checkout"));

    let stored = manager.storage().get_order(&order.order_id).unwrap().unwrap();
    let reference = stored.payment_reference.clone().unwrap();
    assert!(reference.starts_with(&stored.order_number));

    let payment = manager.storage().get_payment(&reference).unwrap().unwrap();
    assert_eq!(payment.amount, 20.0);
    assert_eq!(payment.status, PaymentTxStatus::Pending);
}

#[tokio::test]
async fn test_initiate_requires_all_items_decided() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);

    let err = manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotPayable(_)));
}

#[tokio::test]
async fn test_initiate_requires_an_accepted_item() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    decide(&manager, &order, "p1", "f1", LineItemStatus::Declined).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Declined).unwrap();

    let err = manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotPayable(_)));
}

#[tokio::test]
async fn test_initiate_rejected_for_cod_orders() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::CashOnDelivery);
    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Accepted).unwrap();

    let err = manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotPayable(_)));
}

#[tokio::test]
async fn test_second_initiate_while_in_flight_rejected() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Accepted).unwrap();

    manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap();
    let err = manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotPayable(_)));
}

#[tokio::test]
async fn test_payment_success_completes_and_confirms() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Declined).unwrap();

    manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap();
    let stored = manager.storage().get_order(&order.order_id).unwrap().unwrap();
    let reference = stored.payment_reference.clone().unwrap();

    let updated = manager
        .handle_payment_outcome(&reference, PaymentOutcome::Succeeded)
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Completed);
    assert_eq!(updated.status, OrderStatus::Confirmed);

    let payment = manager.storage().get_payment(&reference).unwrap().unwrap();
    assert_eq!(payment.status, PaymentTxStatus::Completed);
}

#[tokio::test]
async fn test_payment_outcome_is_idempotent() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Accepted).unwrap();

    manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap();
    let stored = manager.storage().get_order(&order.order_id).unwrap().unwrap();
    let reference = stored.payment_reference.clone().unwrap();

    let first = manager
        .handle_payment_outcome(&reference, PaymentOutcome::Succeeded)
        .unwrap();
    let notified = inbox(&manager, "buyer-1").len();

    // At-least-once redelivery: same final state, no second notification
    let second = manager
        .handle_payment_outcome(&reference, PaymentOutcome::Succeeded)
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(inbox(&manager, "buyer-1").len(), notified);
}

#[tokio::test]
async fn test_payment_failure_leaves_order_payable() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Accepted).unwrap();

    manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap();
    let stored = manager.storage().get_order(&order.order_id).unwrap().unwrap();
    let first_reference = stored.payment_reference.clone().unwrap();

    let updated = manager
        .handle_payment_outcome(&first_reference, PaymentOutcome::Failed)
        .unwrap();
    assert_eq!(updated.payment_status, PaymentStatus::Failed);
    // No automatic cancellation
    assert_eq!(updated.status, OrderStatus::Confirmed);

    // The buyer may retry with a fresh transaction
    manager
        .initiate_payment(&order.order_id, "buyer-1")
        .await
        .unwrap();
    let retried = manager.storage().get_order(&order.order_id).unwrap().unwrap();
    let second_reference = retried.payment_reference.clone().unwrap();
    assert_ne!(first_reference, second_reference);

    manager
        .handle_payment_outcome(&second_reference, PaymentOutcome::Succeeded)
        .unwrap();
    let settled = manager.storage().get_order(&order.order_id).unwrap().unwrap();
    assert_eq!(settled.payment_status, PaymentStatus::Completed);
}

#[test]
fn test_unknown_reference_rejected() {
    let manager = test_manager();
    let err = manager
        .handle_payment_outcome("FH0-unknown", PaymentOutcome::Succeeded)
        .unwrap_err();
    assert!(matches!(err, OrderError::PaymentNotFound(_)));
}

// ========================================================================
// Shipping and delivery
// ========================================================================

#[test]
fn test_full_delivery_flow_cod() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::CashOnDelivery);
    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Accepted).unwrap();

    // Farmer ships
    let shipped = manager
        .update_order_status(&order.order_id, "f1", UserRole::Farmer, OrderStatus::Shipped)
        .unwrap();
    assert_eq!(shipped.status, OrderStatus::Shipped);

    // Supplier claims and walks the leg forward
    let mut events = manager.subscribe();
    let claimed = manager.claim_delivery(&order.order_id, "sup-1").unwrap();
    assert_eq!(
        claimed.delivery.as_ref().unwrap().status,
        DeliveryStatus::Assigned
    );
    assert!(matches!(
        events.try_recv().unwrap(),
        OrderEvent::DeliveryAssigned { .. }
    ));

    for status in [
        DeliveryStatus::PickupInProgress,
        DeliveryStatus::PickedUp,
        DeliveryStatus::InTransit,
    ] {
        let updated = manager
            .update_delivery_status(&order.order_id, "sup-1", status)
            .unwrap();
        assert_eq!(updated.delivery.as_ref().unwrap().status, status);
    }

    let delivered = manager
        .update_delivery_status(&order.order_id, "sup-1", DeliveryStatus::Delivered)
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    // Cash on delivery settles at the door
    assert_eq!(delivered.payment_status, PaymentStatus::Completed);
}

#[test]
fn test_order_events_broadcast_after_commit() {
    let manager = test_manager();
    let mut events = manager.subscribe();

    let order = place_order(&manager, PaymentMethod::OnlinePayment);
    assert!(matches!(
        events.try_recv().unwrap(),
        OrderEvent::Created { .. }
    ));

    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    assert!(matches!(
        events.try_recv().unwrap(),
        OrderEvent::ItemDecided {
            status: LineItemStatus::Accepted,
            ..
        }
    ));
}

// ========================================================================
// Role-filtered listings
// ========================================================================

#[test]
fn test_list_orders_by_role() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);

    assert_eq!(
        manager.list_orders_for("buyer-1", UserRole::Buyer).unwrap().len(),
        1
    );
    assert!(manager.list_orders_for("buyer-2", UserRole::Buyer).unwrap().is_empty());
    assert_eq!(
        manager.list_orders_for("f1", UserRole::Farmer).unwrap().len(),
        1
    );
    assert!(manager.list_orders_for("f3", UserRole::Farmer).unwrap().is_empty());

    // Suppliers see nothing until the order is confirmed and claimable
    assert!(manager.list_orders_for("sup-1", UserRole::Supplier).unwrap().is_empty());
    decide(&manager, &order, "p1", "f1", LineItemStatus::Accepted).unwrap();
    decide(&manager, &order, "p2", "f2", LineItemStatus::Accepted).unwrap();
    assert_eq!(
        manager.list_orders_for("sup-1", UserRole::Supplier).unwrap().len(),
        1
    );
}
