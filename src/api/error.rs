// ==========================================
// Warsztat Menager - API 层错误类型
// ==========================================
// 职责: 将仓储/引擎/宿主错误转换为面向用户的错误消息
// 说明: 控制器与外部订单模块只展示消息（状态栏），不展示调用栈
// ==========================================

use crate::engine::error::PlanError;
use crate::engine::host::HostError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 数据错误（目录 / 库存内容不完整或不一致）
    // ==========================================
    #[error("数据错误: {0}")]
    DataError(String),

    #[error("存储读写失败: {0}")]
    StorageError(String),

    // ==========================================
    // 宿主 GUI
    // ==========================================
    #[error("界面调度失败: {0}")]
    HostError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}({})不存在", entity, id))
            }
            RepositoryError::MissingField { entity, id, field } => {
                ApiError::DataError(format!("{}({}) 缺少字段 {}", entity, id, field))
            }
            RepositoryError::Malformed { .. } | RepositoryError::Json(_) => {
                ApiError::DataError(err.to_string())
            }
            RepositoryError::Io { .. } => ApiError::StorageError(err.to_string()),
            RepositoryError::Other(e) => ApiError::Other(e),
        }
    }
}

// ==========================================
// 从 PlanError 转换
// ==========================================
impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::InvalidQuantity(_) => ApiError::InvalidInput(err.to_string()),
            PlanError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}({})不存在", entity, id))
            }
            PlanError::MissingField { .. }
            | PlanError::MissingUnit { .. }
            | PlanError::UnitConflict { .. }
            | PlanError::Malformed(_) => ApiError::DataError(err.to_string()),
        }
    }
}

impl From<HostError> for ApiError {
    fn from(err: HostError) -> Self {
        ApiError::HostError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_error_mapping() {
        let err: ApiError = PlanError::InvalidQuantity(0.0).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = PlanError::NotFound {
            entity: "produkt".into(),
            id: "X".into(),
        }
        .into();
        assert_eq!(err.to_string(), "资源未找到: produkt(X)不存在");

        let err: ApiError = PlanError::MissingUnit { kod: "SR1".into() }.into();
        assert!(matches!(err, ApiError::DataError(ref m) if m.contains("SR1")));
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::missing_field("polprodukt", "PP1", "surowiec").into();
        assert!(matches!(err, ApiError::DataError(ref m) if m.contains("surowiec")));

        let err: ApiError = HostError::SurfaceDestroyed.into();
        assert!(matches!(err, ApiError::HostError(_)));
    }
}
