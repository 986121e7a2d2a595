//! Domain model types shared between the market server and its clients

pub mod notification;
pub mod order;
pub mod payment;
pub mod presence;
pub mod user;

pub use notification::{Notification, NotificationKind};
pub use order::{
    CreateOrderRequest, DeliveryLeg, DeliveryStatus, LineItemStatus, Order, OrderItemInput,
    OrderLineItem, OrderStatus, PaymentMethod, PaymentStatus, ShippingInfo, derive_order_status,
};
pub use payment::{PaymentOutcome, PaymentTransaction, PaymentTxStatus};
pub use presence::{ActiveDelivery, SupplierPresence};
pub use user::UserRole;
