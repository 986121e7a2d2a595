use super::*;

use shared::models::{OrderStatus, PaymentMethod, PaymentStatus};

#[test]
fn test_create_order_success() {
    let manager = test_manager();

    let order = place_order(&manager, PaymentMethod::OnlinePayment);

    // Totals: 2*10 + 3*5 + 50 fee = 85
    assert_eq!(order.total_amount, 85.0);
    assert_eq!(order.delivery_fee, DELIVERY_FEE);
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert!(order.order_number.starts_with("FH"));
    assert_eq!(order.items.len(), 2);
    assert!(order.items.iter().all(|i| !i.status.is_terminal()));

    // Reservations taken
    assert_eq!(manager.available_stock("p1").unwrap(), 8);
    assert_eq!(manager.available_stock("p2").unwrap(), 7);

    // One notification to the buyer and one per distinct farmer
    assert_eq!(inbox(&manager, "buyer-1").len(), 1);
    assert_eq!(inbox(&manager, "f1").len(), 1);
    assert_eq!(inbox(&manager, "f2").len(), 1);
}

#[test]
fn test_create_order_cod_has_no_payment_leg() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::CashOnDelivery);
    assert_eq!(order.payment_status, PaymentStatus::NotApplicable);
}

#[test]
fn test_create_order_subtotals_are_snapshots() {
    let manager = test_manager();
    let order = place_order(&manager, PaymentMethod::OnlinePayment);

    let p1 = order.items.iter().find(|i| i.product_id == "p1").unwrap();
    assert_eq!(p1.price, 10.0);
    assert_eq!(p1.subtotal, 20.0);
    assert_eq!(p1.farmer_id, "f1");
    assert_eq!(p1.product_name, "Tomatoes");
}

#[test]
fn test_insufficient_stock_rejects_whole_order() {
    let manager = manager_with(default_catalog());
    manager.restock("p1", 10).unwrap();
    manager.restock("p2", 1).unwrap(); // not enough for 3

    let err = manager
        .create_order("buyer-1", &request(&[("p1", 2), ("p2", 3)], PaymentMethod::OnlinePayment))
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock { .. }));

    // No partial effects: p1's reservation rolled back with the transaction
    assert_eq!(manager.available_stock("p1").unwrap(), 10);
    assert_eq!(manager.available_stock("p2").unwrap(), 1);
    assert!(manager.list_orders_for("buyer-1", UserRole::Buyer).unwrap().is_empty());
    assert!(inbox(&manager, "buyer-1").is_empty());
    assert!(inbox(&manager, "f1").is_empty());
}

#[test]
fn test_unknown_product_rejected_before_any_write() {
    let manager = test_manager();

    let err = manager
        .create_order("buyer-1", &request(&[("ghost", 1)], PaymentMethod::OnlinePayment))
        .unwrap_err();
    assert!(matches!(err, OrderError::ProductNotFound(_)));
    assert!(manager.list_orders_for("buyer-1", UserRole::Buyer).unwrap().is_empty());
}

#[test]
fn test_empty_items_rejected() {
    let manager = test_manager();
    let err = manager
        .create_order("buyer-1", &request(&[], PaymentMethod::OnlinePayment))
        .unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
}

#[test]
fn test_zero_quantity_rejected() {
    let manager = test_manager();
    let err = manager
        .create_order("buyer-1", &request(&[("p1", 0)], PaymentMethod::OnlinePayment))
        .unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
}

#[test]
fn test_missing_shipping_field_rejected() {
    let manager = test_manager();
    let mut req = request(&[("p1", 1)], PaymentMethod::OnlinePayment);
    req.shipping.address = String::new();

    let err = manager.create_order("buyer-1", &req).unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
    assert_eq!(manager.available_stock("p1").unwrap(), 10);
}

#[test]
fn test_non_farmer_owner_rejected() {
    // p9's owner is not in the farmer set
    let catalog = StaticCatalog::with_farmers(
        vec![meta("p9", "Mystery Box", 10.0, "ghost")],
        &[],
    );
    let manager = manager_with(catalog);
    manager.restock("p9", 10).unwrap();

    let err = manager
        .create_order("buyer-1", &request(&[("p9", 1)], PaymentMethod::OnlinePayment))
        .unwrap_err();
    assert!(matches!(err, OrderError::Validation(_)));
    assert_eq!(manager.available_stock("p9").unwrap(), 10);
}

#[test]
fn test_order_numbers_are_unique() {
    let manager = test_manager();
    let a = place_order(&manager, PaymentMethod::OnlinePayment);
    let b = place_order(&manager, PaymentMethod::OnlinePayment);
    assert_ne!(a.order_number, b.order_number);
}

#[test]
fn test_inventory_conservation_across_creates() {
    let manager = test_manager();

    // initial_stock - sum(reserved by live items) == current_stock
    place_order(&manager, PaymentMethod::OnlinePayment); // p1 -2, p2 -3
    place_order(&manager, PaymentMethod::OnlinePayment); // p1 -2, p2 -3

    assert_eq!(manager.available_stock("p1").unwrap(), 10 - 4);
    assert_eq!(manager.available_stock("p2").unwrap(), 10 - 6);
}
