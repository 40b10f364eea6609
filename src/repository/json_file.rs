// ==========================================
// Warsztat Menager - JSON 文件读写工具
// ==========================================
// 职责: 统一 JSON 文件的读取/写出格式
// 写出格式: UTF-8 无 BOM, 两空格缩进, 末尾换行
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// 读取 JSON 文件
///
/// # 返回
/// - Ok(None): 文件不存在
/// - Ok(Some(value)): 解析成功
/// - Err: 读取失败或 JSON 非法
pub fn read_json_value(path: &Path) -> RepositoryResult<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path).map_err(|source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // 兼容带 BOM 的旧文件
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let value = serde_json::from_str(text)
        .map_err(|e| RepositoryError::malformed(path, e.to_string()))?;
    Ok(Some(value))
}

/// 写出 JSON 文件（先写临时文件再替换）
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, data: &T) -> RepositoryResult<()> {
    let mut text = serde_json::to_string_pretty(data)?;
    text.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| RepositoryError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, text.as_bytes()).map_err(|source| RepositoryError::Io {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| RepositoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// 将标量 JSON 值规范化为字符串（数字 → 文本，字符串去首尾空白）
///
/// null / 数组 / 对象 返回 None
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// 将标量 JSON 值规范化为数字（数字原样；字符串去空白后解析，允许小数逗号）
pub fn scalar_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}
