//! Real-time location fan-out
//!
//! Ingests supplier GPS pings and presence events, keeps the last-known
//! state of every supplier, and broadcasts incremental updates to all
//! interested subscribers with a consistent snapshot on connect. Delivery
//! progress from the order state machine is overlaid onto each supplier's
//! stream so one subscription answers both "is this supplier live" and
//! "what is this supplier doing".

pub mod registry;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};

use shared::message::ServerMessage;
use shared::models::SupplierPresence;
use shared::util::now_millis;

use crate::orders::OrderEvent;
use registry::{PresenceRegistry, RegistryCommand, SharedSnapshot};

/// Capacity of the registry mutation queue
const REGISTRY_QUEUE_CAPACITY: usize = 1024;

/// Tracking service handle
///
/// Cheap to clone behind an Arc; all mutations funnel through the registry
/// actor's queue, reads come from the atomically swapped snapshot.
pub struct TrackingService {
    cmd_tx: mpsc::Sender<RegistryCommand>,
    shared: SharedSnapshot,
    event_tx: broadcast::Sender<ServerMessage>,
    staleness_window_ms: i64,
}

impl TrackingService {
    /// Create the service and spawn its registry actor
    pub fn new(staleness_window_ms: i64, broadcast_capacity: usize) -> Arc<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(REGISTRY_QUEUE_CAPACITY);
        let (event_tx, _) = broadcast::channel(broadcast_capacity);
        let shared: SharedSnapshot = Arc::new(RwLock::new(Arc::new(HashMap::new())));

        let registry = PresenceRegistry::new(shared.clone(), event_tx.clone());
        tokio::spawn(registry.run(cmd_rx));

        Arc::new(Self {
            cmd_tx,
            shared,
            event_tx,
            staleness_window_ms,
        })
    }

    /// Subscribe to the broadcast stream
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.event_tx.subscribe()
    }

    pub fn staleness_window_millis(&self) -> i64 {
        self.staleness_window_ms
    }

    /// Point-in-time consistent snapshot of all active suppliers
    pub fn snapshot(&self) -> Vec<SupplierPresence> {
        let map = self.shared.read().clone();
        map.values().filter(|s| s.is_active).cloned().collect()
    }

    /// Suppliers that are live right now: active AND fresh
    ///
    /// Staleness is evaluated at read time; the registry keeps no timers.
    pub fn live_suppliers(&self) -> Vec<SupplierPresence> {
        let now = now_millis();
        let map = self.shared.read().clone();
        map.values()
            .filter(|s| s.is_live(now, self.staleness_window_ms))
            .cloned()
            .collect()
    }

    /// Record a location ping and broadcast it
    pub async fn ingest(
        &self,
        supplier_id: &str,
        latitude: f64,
        longitude: f64,
        heading: Option<f64>,
        speed: Option<f64>,
        timestamp: i64,
    ) {
        self.send(RegistryCommand::Ingest {
            supplier_id: supplier_id.to_string(),
            latitude,
            longitude,
            heading,
            speed,
            timestamp,
        })
        .await;
    }

    /// Toggle a supplier active/inactive and broadcast immediately
    pub async fn set_presence(
        &self,
        supplier_id: &str,
        is_active: bool,
        service_area: Option<String>,
        timestamp: i64,
    ) {
        self.send(RegistryCommand::SetPresence {
            supplier_id: supplier_id.to_string(),
            is_active,
            service_area,
            timestamp,
        })
        .await;
    }

    /// Feed a committed order event into the delivery overlay
    pub async fn apply_order_event(&self, event: &OrderEvent) {
        match event {
            OrderEvent::DeliveryAssigned {
                order_id,
                supplier_id,
            } => {
                self.send(RegistryCommand::SetDelivery {
                    supplier_id: supplier_id.clone(),
                    order_id: order_id.clone(),
                    status: shared::models::DeliveryStatus::Assigned,
                    timestamp: now_millis(),
                })
                .await;
            }
            OrderEvent::DeliveryStatusChanged {
                order_id,
                supplier_id,
                status,
            } => {
                self.send(RegistryCommand::SetDelivery {
                    supplier_id: supplier_id.clone(),
                    order_id: order_id.clone(),
                    status: *status,
                    timestamp: now_millis(),
                })
                .await;
            }
            _ => {}
        }
    }

    /// Forward committed order events into the overlay until the manager
    /// shuts down
    pub fn spawn_order_event_forwarder(
        self: &Arc<Self>,
        mut events: broadcast::Receiver<OrderEvent>,
    ) {
        let tracking = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => tracking.apply_order_event(&event).await,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Order event forwarder lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    async fn send(&self, cmd: RegistryCommand) {
        if self.cmd_tx.send(cmd).await.is_err() {
            tracing::error!("Presence registry queue closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::DeliveryStatus;

    const WINDOW: i64 = 30 * 60 * 1000;

    fn service() -> Arc<TrackingService> {
        TrackingService::new(WINDOW, 64)
    }

    #[tokio::test]
    async fn test_ingest_appears_in_snapshot() {
        let svc = service();
        let mut rx = svc.subscribe();

        svc.ingest("sup-1", 40.0, -3.7, Some(90.0), Some(12.5), now_millis())
            .await;
        // The broadcast arriving means the snapshot swap already happened
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, ServerMessage::LocationUpdate { .. }));

        let snapshot = svc.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].supplier_id, "sup-1");
        assert!(snapshot[0].is_active);
        assert_eq!(snapshot[0].heading, Some(90.0));
    }

    #[tokio::test]
    async fn test_offline_broadcast_is_immediate() {
        let svc = service();
        let mut rx = svc.subscribe();

        svc.ingest("sup-1", 40.0, -3.7, None, None, now_millis())
            .await;
        rx.recv().await.unwrap();

        svc.set_presence("sup-1", false, None, now_millis()).await;
        let event = rx.recv().await.unwrap();
        match event {
            ServerMessage::PresenceChange {
                supplier_id,
                is_active,
                ..
            } => {
                assert_eq!(supplier_id, "sup-1");
                assert!(!is_active);
            }
            other => panic!("unexpected event: {:?}", other),
        }

        // Inactive suppliers drop out of the active snapshot
        assert!(svc.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_stale_supplier_not_live() {
        let svc = service();
        let mut rx = svc.subscribe();

        let stale_ts = now_millis() - WINDOW - 1000;
        svc.ingest("sup-1", 40.0, -3.7, None, None, stale_ts).await;
        rx.recv().await.unwrap();

        // Still in the active snapshot (flag unchanged), but not live
        assert_eq!(svc.snapshot().len(), 1);
        assert!(svc.live_suppliers().is_empty());
    }

    #[tokio::test]
    async fn test_delivery_overlay_attached_and_cleared() {
        let svc = service();
        let mut rx = svc.subscribe();

        svc.ingest("sup-1", 40.0, -3.7, None, None, now_millis())
            .await;
        rx.recv().await.unwrap();

        svc.apply_order_event(&OrderEvent::DeliveryAssigned {
            order_id: "ord-1".to_string(),
            supplier_id: "sup-1".to_string(),
        })
        .await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.order_id(), Some("ord-1"));

        let snapshot = svc.snapshot();
        let overlay = snapshot[0].delivery.as_ref().unwrap();
        assert_eq!(overlay.order_id, "ord-1");
        assert_eq!(overlay.status, DeliveryStatus::Assigned);

        // Subsequent pings carry the overlay
        svc.ingest("sup-1", 40.1, -3.8, None, None, now_millis())
            .await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.order_id(), Some("ord-1"));

        // Terminal delivery clears the overlay
        svc.apply_order_event(&OrderEvent::DeliveryStatusChanged {
            order_id: "ord-1".to_string(),
            supplier_id: "sup-1".to_string(),
            status: DeliveryStatus::Delivered,
        })
        .await;
        rx.recv().await.unwrap();
        assert!(svc.snapshot()[0].delivery.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_pings_no_lost_update() {
        let svc = service();
        let mut rx = svc.subscribe();

        // Two suppliers ping interleaved; both end up with their last state
        for i in 0..10 {
            svc.ingest("sup-a", f64::from(i), 0.0, None, None, now_millis())
                .await;
            svc.ingest("sup-b", 0.0, f64::from(i), None, None, now_millis())
                .await;
        }
        for _ in 0..20 {
            rx.recv().await.unwrap();
        }

        let snapshot = svc.snapshot();
        let a = snapshot.iter().find(|s| s.supplier_id == "sup-a").unwrap();
        let b = snapshot.iter().find(|s| s.supplier_id == "sup-b").unwrap();
        assert_eq!(a.latitude, 9.0);
        assert_eq!(b.longitude, 9.0);
    }
}
