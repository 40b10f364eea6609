// ==========================================
// Warsztat Menager - 车间与墙体仓储
// ==========================================
// 车间文件: <root>/hale.json   (不存在时自动创建空列表)
// 墙体文件: <root>/sciany.json (不存在时视为空)
// ==========================================

use crate::domain::hall::{Hall, Wall};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_file::{read_json_value, scalar_to_string, write_json_pretty};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const HALLS_FILE: &str = "hale.json";
pub const WALLS_FILE: &str = "sciany.json";

// ==========================================
// LayoutStore - 车间布局仓储
// ==========================================
#[derive(Debug, Clone)]
pub struct LayoutStore {
    halls_path: PathBuf,
    walls_path: PathBuf,
}

impl LayoutStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            halls_path: root.join(HALLS_FILE),
            walls_path: root.join(WALLS_FILE),
        }
    }

    /// 读取车间列表
    ///
    /// 文件不存在时创建空列表文件；非法车间（坐标不满足 x1<x2, y1<y2）跳过并告警
    pub fn load_halls(&self) -> Vec<Hall> {
        if !self.halls_path.exists() {
            let empty: Vec<Hall> = Vec::new();
            if let Err(e) = write_json_pretty(&self.halls_path, &empty) {
                tracing::warn!(path = %self.halls_path.display(), error = %e, "无法创建车间文件");
            } else {
                tracing::info!(path = %self.halls_path.display(), "车间文件不存在，已创建空列表");
            }
            return empty;
        }

        let rows = match self.read_list(&self.halls_path) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(path = %self.halls_path.display(), error = %e, "车间文件读取失败，按空列表处理");
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|row| match serde_json::from_value::<Hall>(row) {
                Ok(hall) if hall.is_valid() => Some(hall),
                Ok(hall) => {
                    tracing::warn!(hala = %hall.nazwa, "车间坐标非法 (需 x1<x2 且 y1<y2)，已跳过");
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "车间记录格式错误，已跳过");
                    None
                }
            })
            .collect()
    }

    pub fn save_halls(&self, halls: &[Hall]) -> RepositoryResult<()> {
        if let Some(bad) = halls.iter().find(|h| !h.is_valid()) {
            return Err(RepositoryError::malformed(
                &self.halls_path,
                format!("车间坐标非法: {}", bad.nazwa),
            ));
        }
        write_json_pretty(&self.halls_path, halls)
    }

    /// 读取墙体列表（hala 数字统一转为字符串）
    pub fn load_walls(&self) -> Vec<Wall> {
        let rows = match self.read_list(&self.walls_path) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(path = %self.walls_path.display(), error = %e, "墙体文件读取失败，按空列表处理");
                return Vec::new();
            }
        };

        rows.into_iter()
            .filter_map(|mut row| {
                if let Some(obj) = row.as_object_mut() {
                    match obj.get("hala").and_then(scalar_to_string) {
                        Some(h) if !h.is_empty() => {
                            obj.insert("hala".to_string(), Value::String(h));
                        }
                        _ => {
                            obj.remove("hala");
                        }
                    }
                }
                match serde_json::from_value::<Wall>(row) {
                    Ok(wall) => Some(wall),
                    Err(e) => {
                        tracing::warn!(error = %e, "墙体记录格式错误，已跳过");
                        None
                    }
                }
            })
            .collect()
    }

    pub fn save_walls(&self, walls: &[Wall]) -> RepositoryResult<()> {
        write_json_pretty(&self.walls_path, walls)
    }

    /// 读取 JSON 列表文件；不存在时为空
    fn read_list(&self, path: &Path) -> RepositoryResult<Vec<Value>> {
        match read_json_value(path)? {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(RepositoryError::malformed(path, "文件必须包含 JSON 列表")),
        }
    }
}
