//! Payment transaction types
//!
//! The gateway itself is an external collaborator; these types are the local
//! record of one attempted charge, correlated with the gateway by reference.

use serde::{Deserialize, Serialize};

/// Payment transaction status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentTxStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentTxStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Asynchronous gateway outcome, delivered at-least-once via webhook
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// One payment attempt against an order
///
/// At most one non-terminal transaction exists per order at a time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentTransaction {
    /// Gateway-correlatable reference, derived from the order number
    pub reference: String,
    pub order_id: String,
    /// Amount charged: the sum of accepted items' subtotals only
    pub amount: f64,
    pub status: PaymentTxStatus,
    pub created_at: i64,
    pub updated_at: i64,
}
