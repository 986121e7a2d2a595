//! 通知分发 - 双通道
//!
//! 每次状态变更产生两路通知：
//!
//! 1. **持久收件箱** - 在触发命令的同一事务中写入 redb
//!    （见 `orders::storage::push_notification`），提交即送达。
//! 2. **实时推送** - 通过 [`LivePush`] 尽力而为地推送到用户的
//!    WebSocket 通道。用户离线、通道已满都只记日志，绝不向调用方
//!    返回错误，也不重试——收件箱才是保证送达的通道。
//!
//! 状态机只依赖 [`LivePush`] 接口，不依赖具体传输。

use dashmap::DashMap;
use tokio::sync::mpsc;

use shared::message::ServerMessage;

/// Best-effort live push to one user's channel
///
/// Implementations must be non-blocking and swallow delivery failures.
pub trait LivePush: Send + Sync {
    fn push(&self, user_id: &str, message: ServerMessage);
}

/// No-op push for tests and headless tooling
pub struct NoopPush;

impl LivePush for NoopPush {
    fn push(&self, _user_id: &str, _message: ServerMessage) {}
}

/// Connected-client registry
///
/// One live channel per user; a new connection replaces the previous one
/// (latest device wins). The sender side is registered by the WebSocket
/// handler on connect and dropped on disconnect.
pub struct ClientHub {
    clients: DashMap<String, mpsc::Sender<ServerMessage>>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    /// Register a user's live channel, replacing any previous connection
    pub fn register(&self, user_id: &str, tx: mpsc::Sender<ServerMessage>) {
        self.clients.insert(user_id.to_string(), tx);
    }

    /// Remove a user's channel if it is still the given connection
    ///
    /// A stale disconnect must not evict the replacement connection, so the
    /// caller passes its own sender for comparison.
    pub fn unregister(&self, user_id: &str, tx: &mpsc::Sender<ServerMessage>) {
        self.clients
            .remove_if(user_id, |_, current| current.same_channel(tx));
    }

    /// Number of currently connected clients
    pub fn connected(&self) -> usize {
        self.clients.len()
    }
}

impl Default for ClientHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LivePush for ClientHub {
    fn push(&self, user_id: &str, message: ServerMessage) {
        let Some(tx) = self.clients.get(user_id) else {
            tracing::debug!(user_id = %user_id, "Live push skipped: user offline");
            return;
        };
        // try_send: a full or closed channel is a dropped push, nothing more
        if let Err(e) = tx.try_send(message) {
            tracing::debug!(user_id = %user_id, error = %e, "Live push dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::NotificationKind;

    fn note() -> ServerMessage {
        ServerMessage::Notification {
            message: "hello".to_string(),
            kind: NotificationKind::OrderUpdate,
        }
    }

    #[tokio::test]
    async fn test_push_reaches_registered_user() {
        let hub = ClientHub::new();
        let (tx, mut rx) = mpsc::channel(4);
        hub.register("u1", tx);

        hub.push("u1", note());
        assert!(matches!(
            rx.recv().await,
            Some(ServerMessage::Notification { .. })
        ));
    }

    #[tokio::test]
    async fn test_push_to_offline_user_is_silent() {
        let hub = ClientHub::new();
        // No panic, no error
        hub.push("ghost", note());
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_error() {
        let hub = ClientHub::new();
        let (tx, _rx) = mpsc::channel(1);
        hub.register("u1", tx);

        hub.push("u1", note());
        hub.push("u1", note()); // buffer full, silently dropped
    }

    #[tokio::test]
    async fn test_stale_unregister_keeps_replacement() {
        let hub = ClientHub::new();
        let (old_tx, _old_rx) = mpsc::channel(4);
        let (new_tx, mut new_rx) = mpsc::channel(4);

        hub.register("u1", old_tx.clone());
        hub.register("u1", new_tx);
        hub.unregister("u1", &old_tx); // stale disconnect

        hub.push("u1", note());
        assert!(new_rx.try_recv().is_ok());
    }
}
