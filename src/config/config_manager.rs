// ==========================================
// Warsztat Menager - 配置管理器
// ==========================================
// 职责: 配置加载、按点分键查询、类型化快照
// 存储: <数据目录>/config.json（嵌套 JSON 对象）
// 红线: 配置以 AppConfig 值的形式在构造时传入控制器与规划器，
//       核心模块不读取全局配置
// ==========================================

use crate::domain::hall::Point;
use crate::domain::types::MachineSourceMode;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_file::{read_json_value, write_json_pretty};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";

// ==========================================
// 类型化配置
// ==========================================

/// 车间视图配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallConfig {
    /// 背景网格间距（像素）
    pub grid_step_px: i32,
    pub show_grid: bool,
    /// 拖动吸附间距；0 表示不吸附
    pub drag_snap_px: i32,
    /// 路径规划网格间距
    pub route_step_px: i32,
    /// 路径搜索包围盒外扩格数
    pub search_margin_steps: i32,
    /// 动画步间隔
    pub anim_interval_ms: u64,
    /// 技术员出发点
    pub service_point: Point,
    pub machine_source: MachineSourceMode,
}

impl Default for HallConfig {
    fn default() -> Self {
        Self {
            grid_step_px: 40,
            show_grid: true,
            drag_snap_px: 4,
            route_step_px: 4,
            search_margin_steps: 16,
            anim_interval_ms: 50,
            service_point: Point::new(0, 0),
            machine_source: MachineSourceMode::Auto,
        }
    }
}

/// 仓库配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagazynConfig {
    /// 库存记录无 prog_alertu 时的预警百分比
    pub alert_procent: u32,
}

impl Default for MagazynConfig {
    fn default() -> Self {
        Self { alert_procent: 10 }
    }
}

/// 配置快照（不可变）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub hall: HallConfig,
    pub magazyn: MagazynConfig,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: Option<PathBuf>,
    root: Map<String, Value>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ConfigManager {
    /// 仅含默认值的配置（不关联文件）
    pub fn in_memory() -> Self {
        Self {
            path: None,
            root: Map::new(),
        }
    }

    /// 从文件加载配置
    ///
    /// # 参数
    /// - path: 配置文件路径
    ///
    /// # 返回
    /// - Ok: 文件不存在时返回默认配置（记录日志）
    /// - Err(Malformed): 文件无法解析或顶层不是对象
    pub fn load(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let root = match read_json_value(path)? {
            None => {
                tracing::info!(path = %path.display(), "配置文件不存在，使用默认配置");
                Map::new()
            }
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(RepositoryError::malformed(path, "配置文件顶层必须是 JSON 对象"));
            }
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            root,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// 按点分键读取原始值（如 "hall.grid_step_px"）
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.root.get(first)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// 按点分键写入值（中间对象自动创建）
    pub fn set_value(&mut self, key: &str, value: Value) {
        let parts: Vec<&str> = key.split('.').filter(|p| !p.is_empty()).collect();
        let Some((last, parents)) = parts.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for part in parents {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            current = next;
        }
        current.insert(last.to_string(), value);
    }

    /// 写回配置文件
    pub fn save(&self) -> RepositoryResult<()> {
        match &self.path {
            Some(path) => write_json_pretty(path, &self.root),
            None => Err(RepositoryError::Other(anyhow::anyhow!("内存配置没有关联文件"))),
        }
    }

    /// 生成类型化配置快照
    ///
    /// 缺失或类型不符的键使用默认值，并逐项记录日志
    pub fn snapshot(&self) -> AppConfig {
        let d = AppConfig::default();
        AppConfig {
            hall: HallConfig {
                grid_step_px: self.get_i32_or(config_keys::GRID_STEP_PX, d.hall.grid_step_px),
                show_grid: self.get_bool_or(config_keys::SHOW_GRID, d.hall.show_grid),
                drag_snap_px: self
                    .get_i32_or(config_keys::DRAG_SNAP_PX, d.hall.drag_snap_px)
                    .max(0),
                route_step_px: self.get_i32_or(config_keys::ROUTE_STEP_PX, d.hall.route_step_px),
                search_margin_steps: self
                    .get_i32_or(config_keys::SEARCH_MARGIN_STEPS, d.hall.search_margin_steps),
                anim_interval_ms: self
                    .get_u64_or(config_keys::ANIM_INTERVAL_MS, d.hall.anim_interval_ms),
                service_point: self.get_point_or(config_keys::SERVICE_POINT, d.hall.service_point),
                machine_source: self
                    .get_str(config_keys::MACHINE_SOURCE)
                    .map(MachineSourceMode::parse_or_auto)
                    .unwrap_or(d.hall.machine_source),
            },
            magazyn: MagazynConfig {
                alert_procent: self
                    .get_u64_or(config_keys::ALERT_PROCENT, u64::from(d.magazyn.alert_procent))
                    .try_into()
                    .unwrap_or(d.magazyn.alert_procent),
            },
        }
    }

    // ==========================================
    // 类型化读取（带默认值）
    // ==========================================

    fn get_i32_or(&self, key: &str, default: i32) -> i32 {
        match self.get_value(key) {
            Some(v) => match v.as_i64().and_then(|n| i32::try_from(n).ok()) {
                Some(n) => n,
                None => invalid(key, v, default),
            },
            None => missing(key, default),
        }
    }

    fn get_u64_or(&self, key: &str, default: u64) -> u64 {
        match self.get_value(key) {
            Some(v) => match v.as_u64() {
                Some(n) => n,
                None => invalid(key, v, default),
            },
            None => missing(key, default),
        }
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        match self.get_value(key) {
            Some(v) => match v.as_bool() {
                Some(b) => b,
                None => invalid(key, v, default),
            },
            None => missing(key, default),
        }
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        let value = self.get_value(key).and_then(Value::as_str);
        if value.is_none() {
            tracing::debug!(config_key = key, "配置项缺失，使用默认值");
        }
        value
    }

    /// 点坐标: [x, y] 或 {"x": .., "y": ..}
    fn get_point_or(&self, key: &str, default: Point) -> Point {
        let Some(v) = self.get_value(key) else {
            return missing(key, default);
        };
        let coords = match v {
            Value::Array(items) if items.len() == 2 => items[0].as_i64().zip(items[1].as_i64()),
            Value::Object(obj) => obj
                .get("x")
                .and_then(Value::as_i64)
                .zip(obj.get("y").and_then(Value::as_i64)),
            _ => None,
        };
        match coords.and_then(|(x, y)| Some(Point::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))) {
            Some(p) => p,
            None => invalid(key, v, default),
        }
    }
}

fn missing<T: std::fmt::Debug>(key: &str, default: T) -> T {
    tracing::debug!(config_key = key, default = ?default, "配置项缺失，使用默认值");
    default
}

fn invalid<T: std::fmt::Debug>(key: &str, raw: &Value, default: T) -> T {
    tracing::warn!(config_key = key, raw_value = %raw, default = ?default, "配置项类型错误，使用默认值");
    default
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 车间视图
    pub const GRID_STEP_PX: &str = "hall.grid_step_px";
    pub const SHOW_GRID: &str = "hall.show_grid";
    pub const DRAG_SNAP_PX: &str = "hall.drag_snap_px";

    // 路径规划与动画
    pub const ROUTE_STEP_PX: &str = "hall.route_step_px";
    pub const SEARCH_MARGIN_STEPS: &str = "hall.search_margin_steps";
    pub const ANIM_INTERVAL_MS: &str = "hall.anim_interval_ms";
    pub const SERVICE_POINT: &str = "hall.service_point";

    // 机器数据源 (auto / primary / legacy)
    pub const MACHINE_SOURCE: &str = "hall.machine_source";

    // 仓库
    pub const ALERT_PROCENT: &str = "magazyn.alert_procent";
}
