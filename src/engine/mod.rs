// ==========================================
// Warsztat Menager - 引擎层
// ==========================================
// C1: BOM 展开与物料需求（同步、纯计算）
// C2: 路径规划、路线动画、车间视图控制器
// ==========================================
// 红线: 引擎不直接读写文件格式细节，文件规范化在 repository 层
// 红线: 引擎只通过 host 模块的 trait 接触宿主 GUI
// ==========================================

pub mod animator;
pub mod bom;
pub mod error;
pub mod hall_controller;
pub mod host;
pub mod material_check;
pub mod path_planner;

// 重导出核心引擎
pub use animator::RouteAnimator;
pub use bom::{BomPlanner, RawNeeds, RawRequirement, SemiNeeds, SemiRequirement};
pub use error::{PlanError, PlanResult};
pub use hall_controller::HallController;
pub use host::{HallView, HostError, HostScheduler, ManualScheduler, NoOpHallView, TimerId};
pub use material_check::{AlertKind, MaterialAlert, MaterialChecker, MaterialReport};
pub use path_planner::{a_star, PathPlanner};
