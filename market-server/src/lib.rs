//! FarmHub Market Server - 农产品市场订单与配送服务端
//!
//! # 架构概述
//!
//! 本模块是 Market Server 的主入口，提供以下核心功能：
//!
//! - **订单状态机** (`orders`): 多方订单处理、库存预留、支付触发
//! - **实时追踪** (`tracking`): 配送员位置登记与广播
//! - **通知分发** (`notify`): 持久收件箱 + 尽力而为实时推送
//! - **支付网关适配** (`payment`): 外部支付网关的窄接口
//! - **目录** (`db`, `services`): 嵌入式 SurrealDB 商品目录
//! - **HTTP API** (`api`): RESTful API 接口 + WebSocket 订阅
//!
//! # 模块结构
//!
//! ```text
//! market-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证
//! ├── api/           # HTTP 路由和处理器
//! ├── orders/        # 订单状态机 (redb 事务核心)
//! ├── tracking/      # 位置登记与广播
//! ├── notify/        # 通知分发
//! ├── payment/       # 支付网关适配
//! ├── services/      # 目录服务
//! ├── db/            # 数据库层 (SurrealDB)
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod notify;
pub mod orders;
pub mod payment;
pub mod services;
pub mod tracking;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{MarketStorage, OrdersManager};
pub use tracking::TrackingService;
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use shared::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv + 日志)
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    init_logger();
    Ok(())
}

/// 打印启动横幅
pub fn print_banner() {
    tracing::info!("========================================");
    tracing::info!("  FarmHub Market Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
}
