//! 实时订阅协议消息类型
//!
//! 这些类型在 market-server 和订阅客户端之间共享，
//! 通过 WebSocket 传输（JSON 编码，`type` 字段区分事件）。
//!
//! # 消息流
//!
//! ```text
//! Subscriber ──connect──► Server ──► snapshot (所有活跃配送员)
//!                                ──► location_update / presence_change /
//!                                    delivery_status_update (增量事件)
//!                                ──► notification (点对点推送)
//! Subscriber ──subscribe──► Server   (调整订阅范围)
//! ```

pub mod payload;

pub use payload::{ClientMessage, ServerMessage, SubscriptionScope};
