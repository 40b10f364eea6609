// ==========================================
// Warsztat Menager - API 层
// ==========================================
// 职责: 提供业务 API 接口，供订单模块与界面调用
// ==========================================

pub mod error;
pub mod material_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use material_api::{MaterialApi, RawRequirementRow, SemiRequirementRow};
