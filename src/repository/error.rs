// ==========================================
// Warsztat Menager - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use std::path::PathBuf;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 查找错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    // ===== 数据质量错误 =====
    #[error("缺少必填字段 (entity={entity}, id={id}): {field}")]
    MissingField {
        entity: String,
        id: String,
        field: String,
    },

    #[error("数据格式错误 ({}): {message}", path.display())]
    Malformed { path: PathBuf, message: String },

    // ===== 文件错误 =====
    #[error("文件读写失败 ({}): {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON 序列化失败: {0}")]
    Json(#[from] serde_json::Error),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        }
    }

    pub fn missing_field(entity: &str, id: impl Into<String>, field: &str) -> Self {
        RepositoryError::MissingField {
            entity: entity.to_string(),
            id: id.into(),
            field: field.to_string(),
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RepositoryError::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
