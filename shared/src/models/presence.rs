//! Supplier presence types
//!
//! Presence is in-memory state, rebuilt from a server snapshot on each
//! subscriber connect. Absence from the registry is equivalent to
//! `is_active = false`.

use super::order::DeliveryStatus;
use serde::{Deserialize, Serialize};

/// Delivery overlay carried on a supplier's broadcast payload while the
/// supplier is actively fulfilling an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActiveDelivery {
    pub order_id: String,
    pub status: DeliveryStatus,
}

/// Last-known state of one supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SupplierPresence {
    pub supplier_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Timestamp of the last ping or presence event (epoch millis)
    pub last_updated: i64,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_area: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<ActiveDelivery>,
}

impl SupplierPresence {
    /// Read-time liveness check
    ///
    /// The registry never expires entries on its own clock; a record older
    /// than the staleness window is not-live regardless of its active flag.
    pub fn is_live(&self, now_millis: i64, staleness_window_millis: i64) -> bool {
        self.is_active && now_millis - self.last_updated < staleness_window_millis
    }
}
