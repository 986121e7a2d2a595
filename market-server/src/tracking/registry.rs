//! 位置登记表 - 单一所有者 actor
//!
//! ```text
//!  ingest / presence / delivery overlay
//!        │ (mpsc, 串行化所有变更)
//!        ▼
//!  PresenceRegistry (独占所有 HashMap)
//!        ├── 原子换出不可变快照 ──► 读取方 (Connect / API)
//!        └── broadcast ──► 所有订阅者 (WebSocket)
//! ```
//!
//! 变更只在本 actor 内发生，同一配送员的并发 ping 不会互相覆盖；
//! 读取方拿到的快照永远是某个完整状态，不会读到半更新的记录。
//! 广播通过 tokio broadcast 与锁解耦，慢订阅者只会 lag，不会阻塞登记。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};

use shared::message::ServerMessage;
use shared::models::{ActiveDelivery, DeliveryStatus, SupplierPresence};

/// Registry mutations, applied strictly in arrival order
#[derive(Debug, Clone)]
pub enum RegistryCommand {
    /// Location ping from a supplier client
    Ingest {
        supplier_id: String,
        latitude: f64,
        longitude: f64,
        heading: Option<f64>,
        speed: Option<f64>,
        timestamp: i64,
    },
    /// Explicit active/inactive toggle
    SetPresence {
        supplier_id: String,
        is_active: bool,
        service_area: Option<String>,
        timestamp: i64,
    },
    /// Delivery overlay from the order state machine
    SetDelivery {
        supplier_id: String,
        order_id: String,
        status: DeliveryStatus,
        timestamp: i64,
    },
}

/// Shared read handle: an immutable snapshot swapped atomically after every
/// mutation
pub type SharedSnapshot = Arc<RwLock<Arc<HashMap<String, SupplierPresence>>>>;

/// Exclusive owner of the presence map
pub struct PresenceRegistry {
    suppliers: HashMap<String, SupplierPresence>,
    shared: SharedSnapshot,
    event_tx: broadcast::Sender<ServerMessage>,
}

impl PresenceRegistry {
    pub fn new(shared: SharedSnapshot, event_tx: broadcast::Sender<ServerMessage>) -> Self {
        Self {
            suppliers: HashMap::new(),
            shared,
            event_tx,
        }
    }

    /// Consume commands until the queue closes
    pub async fn run(mut self, mut rx: mpsc::Receiver<RegistryCommand>) {
        tracing::info!("Presence registry started");
        while let Some(cmd) = rx.recv().await {
            self.apply(cmd);
        }
        tracing::info!("Presence registry stopped");
    }

    fn apply(&mut self, cmd: RegistryCommand) {
        let event = match cmd {
            RegistryCommand::Ingest {
                supplier_id,
                latitude,
                longitude,
                heading,
                speed,
                timestamp,
            } => {
                let entry = self
                    .suppliers
                    .entry(supplier_id.clone())
                    .or_insert_with(|| empty_presence(&supplier_id, timestamp));
                entry.latitude = latitude;
                entry.longitude = longitude;
                entry.heading = heading;
                entry.speed = speed;
                entry.last_updated = timestamp;
                entry.is_active = true;
                Some(ServerMessage::LocationUpdate {
                    supplier: entry.clone(),
                })
            }
            RegistryCommand::SetPresence {
                supplier_id,
                is_active,
                service_area,
                timestamp,
            } => {
                let entry = self
                    .suppliers
                    .entry(supplier_id.clone())
                    .or_insert_with(|| empty_presence(&supplier_id, timestamp));
                entry.is_active = is_active;
                entry.last_updated = timestamp;
                if service_area.is_some() {
                    entry.service_area = service_area;
                }
                // 离线必须立即广播，不能等过期窗口
                Some(ServerMessage::PresenceChange {
                    supplier_id,
                    is_active,
                    timestamp,
                })
            }
            RegistryCommand::SetDelivery {
                supplier_id,
                order_id,
                status,
                timestamp,
            } => {
                let entry = self
                    .suppliers
                    .entry(supplier_id.clone())
                    .or_insert_with(|| empty_presence(&supplier_id, timestamp));
                if status.is_terminal() {
                    entry.delivery = None;
                } else {
                    entry.delivery = Some(ActiveDelivery {
                        order_id: order_id.clone(),
                        status,
                    });
                }
                Some(ServerMessage::DeliveryStatusUpdate {
                    supplier_id,
                    order_id,
                    status,
                    timestamp,
                })
            }
        };

        // 先换快照再广播：订阅者收到事件后读快照一定不落后于事件
        *self.shared.write() = Arc::new(self.suppliers.clone());

        if let Some(event) = event {
            let _ = self.event_tx.send(event);
        }
    }
}

/// Placeholder entry for a supplier seen before its first ping
///
/// Position arrives with the first ping; until then the entry only carries
/// presence/overlay state.
fn empty_presence(supplier_id: &str, timestamp: i64) -> SupplierPresence {
    SupplierPresence {
        supplier_id: supplier_id.to_string(),
        latitude: 0.0,
        longitude: 0.0,
        heading: None,
        speed: None,
        last_updated: timestamp,
        is_active: false,
        service_area: None,
        delivery: None,
    }
}
