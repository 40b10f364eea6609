// ==========================================
// Warsztat Menager - 核心库
// ==========================================
// C1: BOM 展开与物料需求规划
// C2: 车间视图空间模型、A* 路径规划、路线动画、车间控制器
// 存储: JSON 文件（数据目录）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "pl");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - JSON 文件访问
pub mod repository;

// 引擎层 - 规划、路径、动画、控制器
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组件组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EditMode, MachineSourceMode, MachineStatus};

// 领域实体
pub use domain::{Hall, Machine, Point, Product, Route, SemiProduct, StockItem, Wall};

// 引擎
pub use engine::{
    a_star, BomPlanner, HallController, MaterialChecker, MaterialReport, PathPlanner,
    PlanError, RouteAnimator,
};

// API
pub use api::{ApiError, MaterialApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Warsztat Menager";
