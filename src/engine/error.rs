// ==========================================
// Warsztat Menager - 引擎层错误类型
// ==========================================
// 物料规划（BOM 展开 / 库存校验）的统一错误
// 红线: 规划器错误原样上抛，不重试、不替换
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("数量必须大于 0: {0}")]
    InvalidQuantity(f64),

    #[error("未找到 {entity}: {id}")]
    NotFound { entity: String, id: String },

    #[error("缺少必填字段 {field} ({entity} {id})")]
    MissingField {
        entity: String,
        id: String,
        field: String,
    },

    #[error("无法确定原材料 {kod} 的计量单位")]
    MissingUnit { kod: String },

    #[error("原材料 {kod} 单位冲突: {first} != {other}")]
    UnitConflict {
        kod: String,
        first: String,
        other: String,
    },

    #[error("数据格式错误: {0}")]
    Malformed(String),
}

impl From<RepositoryError> for PlanError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => PlanError::NotFound { entity, id },
            RepositoryError::MissingField { entity, id, field } => {
                PlanError::MissingField { entity, id, field }
            }
            other => PlanError::Malformed(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type PlanResult<T> = Result<T, PlanError>;
