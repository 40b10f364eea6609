// ==========================================
// Warsztat Menager - 库存仓储
// ==========================================
// 文件: <root>/magazyn/surowce.json
// 格式: { "<kod>": {"stan": .., "jednostka": .., "prog_alertu": ..}, ... }
// 红线: 只读快照；读取失败时返回空快照并输出诊断
// ==========================================

use crate::domain::stock::{StockItem, StockSnapshot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_file::read_json_value;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const STOCK_FILE: &str = "magazyn/surowce.json";

// ==========================================
// StockStore - 库存仓储
// ==========================================
#[derive(Debug, Clone)]
pub struct StockStore {
    path: PathBuf,
}

impl StockStore {
    /// 基于数据目录创建（使用默认相对路径）
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            path: root.as_ref().join(STOCK_FILE),
        }
    }

    /// 直接指定库存文件路径
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取库存快照
    ///
    /// # 规则
    /// - 文件不存在: 空快照
    /// - 顶层不是对象: Malformed
    /// - 单条记录非法（缺 stan / 负数 / 类型错误）: 跳过并告警
    pub fn load(&self) -> RepositoryResult<StockSnapshot> {
        let Some(value) = read_json_value(&self.path)? else {
            tracing::info!(path = %self.path.display(), "库存文件不存在，使用空快照");
            return Ok(StockSnapshot::new());
        };

        let Value::Object(map) = value else {
            return Err(RepositoryError::malformed(&self.path, "库存文件顶层必须是对象"));
        };

        let mut snapshot = StockSnapshot::new();
        for (kod, entry) in map {
            let kod = kod.trim().to_string();
            if kod.is_empty() {
                tracing::warn!("跳过空代码的库存记录");
                continue;
            }
            match serde_json::from_value::<StockItem>(entry) {
                Ok(item) if item.stan < 0.0 => {
                    tracing::warn!(kod = %kod, stan = item.stan, "库存为负，记录已跳过");
                }
                Ok(item) if item.prog_alertu.map(|p| p < 0.0).unwrap_or(false) => {
                    tracing::warn!(kod = %kod, "预警阈值为负，记录已跳过");
                }
                Ok(item) => {
                    snapshot.insert(kod, item);
                }
                Err(e) => {
                    tracing::warn!(kod = %kod, error = %e, "库存记录格式错误，已跳过");
                }
            }
        }
        Ok(snapshot)
    }

    /// 读取库存快照（失败时返回空快照）
    pub fn get_stock(&self) -> StockSnapshot {
        match self.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "库存读取失败，返回空快照");
                StockSnapshot::new()
            }
        }
    }

    /// 查询单个原材料
    pub fn lookup(&self, kod: &str) -> Option<StockItem> {
        self.get_stock().remove(kod.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(text: &str) -> (TempDir, StockStore) {
        let dir = TempDir::new().unwrap();
        let store = StockStore::new(dir.path());
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), text).unwrap();
        (dir, store)
    }

    #[test]
    fn test_load_valid_entries() {
        let (_dir, store) = store_with(
            r#"{
                "SR001": {"nazwa": "Rura", "stan": 120, "jednostka": "mb", "prog_alertu": 10},
                "SR002": {"stan": 60, "jednostka": "mb"}
            }"#,
        );
        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["SR001"].prog_alertu, Some(10.0));
        assert_eq!(snapshot["SR002"].prog_alertu, None);
        assert_eq!(store.lookup("SR002").unwrap().stan, 60.0);
        assert!(store.lookup("SR404").is_none());
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let (_dir, store) = store_with(
            r#"{
                "A": {"stan": -1, "jednostka": "szt"},
                "B": {"jednostka": "szt"},
                "C": "tekst",
                "D": {"stan": 5, "jednostka": "szt", "prog_alertu": 1}
            }"#,
        );
        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["D"]);
    }

    #[test]
    fn test_read_error_yields_empty_snapshot() {
        let (_dir, store) = store_with("[1, 2, 3]");
        assert!(store.load().is_err());
        assert!(store.get_stock().is_empty());

        let dir = TempDir::new().unwrap();
        assert!(StockStore::new(dir.path()).get_stock().is_empty());
    }
}
