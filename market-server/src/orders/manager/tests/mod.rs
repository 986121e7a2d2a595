use super::*;

use std::collections::{HashMap, HashSet};

use shared::models::{
    CreateOrderRequest, Notification, OrderItemInput, PaymentMethod, ShippingInfo,
};

use crate::notify::NoopPush;
use crate::payment::MockGateway;
use crate::services::ProductMeta;

mod test_core;
mod test_flows;

const DELIVERY_FEE: f64 = 50.0;

// ========================================================================
// Test catalog
// ========================================================================

/// Fixed in-memory catalog for manager tests
pub(crate) struct StaticCatalog {
    products: HashMap<String, ProductMeta>,
    farmers: HashSet<String>,
}

impl StaticCatalog {
    fn new(metas: Vec<ProductMeta>) -> Self {
        let farmers = metas.iter().map(|m| m.farmer_id.clone()).collect();
        let products = metas.into_iter().map(|m| (m.id.clone(), m)).collect();
        Self { products, farmers }
    }

    /// Same catalog, but with an explicit farmer set (to model owners that
    /// lost their farmer standing)
    fn with_farmers(metas: Vec<ProductMeta>, farmers: &[&str]) -> Self {
        let mut catalog = Self::new(metas);
        catalog.farmers = farmers.iter().map(|f| f.to_string()).collect();
        catalog
    }
}

impl Catalog for StaticCatalog {
    fn product_meta(&self, product_id: &str) -> Option<ProductMeta> {
        self.products.get(product_id).cloned()
    }

    fn is_farmer(&self, user_id: &str) -> bool {
        self.farmers.contains(user_id)
    }
}

fn meta(id: &str, name: &str, price: f64, farmer_id: &str) -> ProductMeta {
    ProductMeta {
        id: id.to_string(),
        name: name.to_string(),
        price,
        farmer_id: farmer_id.to_string(),
    }
}

/// Two farmers: f1 owns p1 ($10) and p3 ($2.5), f2 owns p2 ($5)
fn default_catalog() -> StaticCatalog {
    StaticCatalog::new(vec![
        meta("p1", "Tomatoes", 10.0, "f1"),
        meta("p2", "Potatoes", 5.0, "f2"),
        meta("p3", "Eggs", 2.5, "f1"),
    ])
}

// ========================================================================
// Manager construction
// ========================================================================

fn manager_with(catalog: StaticCatalog) -> OrdersManager {
    let storage = MarketStorage::open_in_memory().unwrap();
    OrdersManager::new(
        storage,
        Arc::new(catalog),
        Arc::new(MockGateway),
        Arc::new(NoopPush),
        DELIVERY_FEE,
    )
}

fn test_manager() -> OrdersManager {
    let manager = manager_with(default_catalog());
    for product in ["p1", "p2", "p3"] {
        manager.restock(product, 10).unwrap();
    }
    manager
}

// ========================================================================
// Request builders
// ========================================================================

fn shipping() -> ShippingInfo {
    ShippingInfo {
        address: "12 Market Road".to_string(),
        city: "Valencia".to_string(),
        postal_code: "46001".to_string(),
        phone: "+34 600 000 000".to_string(),
    }
}

fn request(items: &[(&str, u32)], payment_method: PaymentMethod) -> CreateOrderRequest {
    CreateOrderRequest {
        items: items
            .iter()
            .map(|(product_id, quantity)| OrderItemInput {
                product_id: product_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
        shipping: shipping(),
        payment_method,
        notes: None,
    }
}

/// The worked example: p1 x2 from f1 ($20) + p2 x3 from f2 ($15), fee 50
fn place_order(manager: &OrdersManager, payment_method: PaymentMethod) -> Order {
    manager
        .create_order("buyer-1", &request(&[("p1", 2), ("p2", 3)], payment_method))
        .unwrap()
}

fn item_id_for(order: &Order, product_id: &str) -> String {
    order
        .items
        .iter()
        .find(|i| i.product_id == product_id)
        .unwrap()
        .item_id
        .clone()
}

fn decide(
    manager: &OrdersManager,
    order: &Order,
    product_id: &str,
    farmer_id: &str,
    decision: LineItemStatus,
) -> OrderResult<Order> {
    manager.update_line_item(
        &order.order_id,
        &item_id_for(order, product_id),
        farmer_id,
        decision,
        None,
    )
}

fn inbox(manager: &OrdersManager, user_id: &str) -> Vec<Notification> {
    manager.notifications_for(user_id).unwrap()
}
