use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::notify::{ClientHub, LivePush};
use crate::orders::{MarketStorage, OrdersManager};
use crate::payment::{HttpGateway, MockGateway, PaymentGateway};
use crate::services::{Catalog, CatalogService};
use crate::tracking::TrackingService;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是市场节点的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式目录数据库 |
/// | catalog | Arc<CatalogService> | 商品目录服务 |
/// | orders | Arc<OrdersManager> | 订单状态机 |
/// | tracking | Arc<TrackingService> | 位置登记与广播 |
/// | hub | Arc<ClientHub> | 已连接客户端注册表 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式目录数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 商品目录服务
    pub catalog: Arc<CatalogService>,
    /// 订单状态机
    pub orders: Arc<OrdersManager>,
    /// 位置登记与广播
    pub tracking: Arc<TrackingService>,
    /// 已连接客户端注册表 (实时推送)
    pub hub: Arc<ClientHub>,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 目录数据库 (work_dir/database/catalog.db) + 缓存预热
    /// 3. 订单存储 (work_dir/database/orders.redb)
    /// 4. 各服务 (Hub, Gateway, Tracking, OrdersManager, JWT)
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        // 1. Catalog database
        let db_path = config.database_dir().join("catalog.db");
        let db_service = DbService::new(&db_path.to_string_lossy())
            .await
            .expect("Failed to initialize catalog database");
        let db = db_service.db;

        let catalog = CatalogService::new(db.clone());
        if let Err(e) = catalog.warmup().await {
            tracing::error!(error = %e, "Catalog warmup failed, caches start cold");
        }

        // 2. Order core storage
        let storage = MarketStorage::open(config.database_dir().join("orders.redb"))
            .expect("Failed to open order storage");

        // 3. Services
        let hub = Arc::new(ClientHub::new());
        let gateway: Arc<dyn PaymentGateway> = match &config.payment_gateway_url {
            Some(url) => Arc::new(HttpGateway::new(url.clone())),
            None => {
                tracing::warn!("PAYMENT_GATEWAY_URL not set, using the mock gateway");
                Arc::new(MockGateway)
            }
        };
        let tracking = TrackingService::new(
            config.staleness_window_millis(),
            config.tracking_channel_capacity,
        );
        let orders = Arc::new(OrdersManager::new(
            storage,
            catalog.clone() as Arc<dyn Catalog>,
            gateway,
            hub.clone() as Arc<dyn LivePush>,
            config.delivery_fee,
        ));
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

        Self {
            config: config.clone(),
            db,
            catalog,
            orders,
            tracking,
            hub,
            jwt_service,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 之前调用
    ///
    /// 启动的任务：
    /// - 订单事件转发器 (配送状态 → 追踪覆盖层)
    pub async fn start_background_tasks(&self) {
        self.tracking
            .spawn_order_event_forwarder(self.orders.subscribe());
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
