//! Payment gateway adapter
//!
//! The gateway is an external collaborator consumed through a narrow
//! interface: initiate a charge, receive an asynchronous outcome. The order
//! core depends only on the [`PaymentGateway`] trait.

mod gateway;

pub use gateway::{GatewayError, HttpGateway, InitiatedPayment, MockGateway, PaymentGateway};
