// ==========================================
// Warsztat Menager - 机器数据仓储
// ==========================================
// 主文件:   <root>/maszyny.json
// 旧文件:   <root>/maszyny/maszyny.json
// 红线: 文件格式差异（列表/对象、旧字段名）只在这里规范化
// 红线: 合并时主文件优先；被合并掉的记录必须记录日志
// ==========================================

use crate::domain::hall::{Machine, Point};
use crate::domain::types::MachineSourceMode;
use crate::repository::error::RepositoryResult;
use crate::repository::json_file::{read_json_value, scalar_to_string, write_json_pretty};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const PRIMARY_FILE: &str = "maszyny.json";
pub const LEGACY_FILE: &str = "maszyny/maszyny.json";

/// 旧数据中可能出现的 id 字段名（按优先级）
const ID_ALIASES: [&str; 3] = ["id", "nr_ewid", "nr"];

/// 机器加载结果
#[derive(Debug, Clone)]
pub struct MachineLoadResult {
    /// 规范化并排序后的机器列表
    pub machines: Vec<Machine>,
    /// 实际生效的数据源
    pub active_mode: MachineSourceMode,
    pub count_primary: usize,
    pub count_legacy: usize,
}

// ==========================================
// MachineStore - 机器仓储
// ==========================================
#[derive(Debug, Clone)]
pub struct MachineStore {
    primary: PathBuf,
    legacy: PathBuf,
}

impl MachineStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            primary: root.join(PRIMARY_FILE),
            legacy: root.join(LEGACY_FILE),
        }
    }

    pub fn with_paths(primary: impl Into<PathBuf>, legacy: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            legacy: legacy.into(),
        }
    }

    pub fn primary_path(&self) -> &Path {
        &self.primary
    }

    /// 加载机器列表
    ///
    /// # 参数
    /// - mode: auto 合并两个文件（主文件优先）；primary / legacy 只读指定文件
    ///
    /// # 返回
    /// 读取失败的文件按空列表处理（已输出诊断），不会返回错误
    pub fn load(&self, mode: MachineSourceMode) -> MachineLoadResult {
        let primary = read_machine_file(&self.primary);
        let legacy = read_machine_file(&self.legacy);
        let (count_primary, count_legacy) = (primary.len(), legacy.len());

        let (machines, active_mode) = match mode {
            MachineSourceMode::Primary => (sort_machines(primary), MachineSourceMode::Primary),
            MachineSourceMode::Legacy => (sort_machines(legacy), MachineSourceMode::Legacy),
            MachineSourceMode::Auto => match (primary.is_empty(), legacy.is_empty()) {
                (false, false) => (merge_unique(primary, legacy), MachineSourceMode::Auto),
                (false, true) => (sort_machines(primary), MachineSourceMode::Primary),
                (true, false) => (sort_machines(legacy), MachineSourceMode::Legacy),
                (true, true) => (Vec::new(), MachineSourceMode::Primary),
            },
        };

        tracing::info!(
            requested = %mode,
            active = %active_mode,
            count_primary,
            count_legacy,
            loaded = machines.len(),
            "机器列表已加载"
        );

        MachineLoadResult {
            machines,
            active_mode,
            count_primary,
            count_legacy,
        }
    }

    /// 保存机器列表到主文件（按 id 长度-字典序排序）
    pub fn save(&self, machines: &[Machine]) -> RepositoryResult<()> {
        let sorted = sort_machines(machines.to_vec());
        write_json_pretty(&self.primary, &sorted)?;
        tracing::debug!(path = %self.primary.display(), count = sorted.len(), "机器列表已保存");
        Ok(())
    }
}

// ==========================================
// 规范化
// ==========================================

/// 读取单个机器文件；失败时返回空列表并告警
fn read_machine_file(path: &Path) -> Vec<Machine> {
    match read_json_value(path) {
        Ok(Some(value)) => normalize_machine_rows(value, path),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "机器文件读取失败，按空列表处理");
            Vec::new()
        }
    }
}

/// 将列表或以 id 为键的对象规范化为机器列表
///
/// 同一文件内 id 重复时后者覆盖前者（记录日志）
pub fn normalize_machine_rows(value: Value, source: &Path) -> Vec<Machine> {
    let rows: Vec<(Option<String>, Value)> = match value {
        Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
        Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        other => {
            tracing::warn!(
                path = %source.display(),
                kind = %json_kind(&other),
                "机器文件必须是列表或对象"
            );
            return Vec::new();
        }
    };

    let mut order: Vec<String> = Vec::new();
    let mut by_id: HashMap<String, Machine> = HashMap::new();

    for (key, row) in rows {
        let Value::Object(obj) = row else {
            tracing::warn!(path = %source.display(), "跳过非对象的机器记录");
            continue;
        };
        let Some(machine) = normalize_machine(obj, key.as_deref(), source) else {
            continue;
        };
        let id = machine.id.clone();
        if by_id.insert(id.clone(), machine).is_some() {
            tracing::warn!(
                path = %source.display(),
                machine_id = %id,
                "同一文件内机器 id 重复，保留后出现的记录"
            );
        } else {
            order.push(id);
        }
    }

    order.into_iter().filter_map(|id| by_id.remove(&id)).collect()
}

/// 规范化单条机器记录
///
/// - id: id / nr_ewid / nr / 对象键，去除首尾空白
/// - 位置: pozycja{x,y} 或旧格式顶层 x / y
/// - hala: 数字转字符串
/// - status: 缺失时视为 sprawna
fn normalize_machine(mut obj: Map<String, Value>, key: Option<&str>, source: &Path) -> Option<Machine> {
    let id = ID_ALIASES
        .iter()
        .filter_map(|alias| obj.get(*alias).and_then(scalar_to_string))
        .find(|s| !s.is_empty())
        .or_else(|| key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()));

    let Some(id) = id else {
        tracing::warn!(path = %source.display(), "机器记录缺少 id，已跳过");
        return None;
    };
    obj.insert("id".to_string(), Value::String(id.clone()));

    if !obj.contains_key("pozycja") {
        let x = obj.remove("x").and_then(|v| v.as_f64());
        let y = obj.remove("y").and_then(|v| v.as_f64());
        match (x, y) {
            (Some(x), Some(y)) => {
                let pos = Point::new(x.round() as i32, y.round() as i32);
                obj.insert("pozycja".to_string(), serde_json::to_value(pos).ok()?);
            }
            _ => {
                tracing::warn!(path = %source.display(), machine_id = %id, "机器缺少位置，已跳过");
                return None;
            }
        }
    }

    if let Some(hala) = obj.get("hala") {
        match scalar_to_string(hala) {
            Some(h) if !h.is_empty() => {
                obj.insert("hala".to_string(), Value::String(h));
            }
            _ => {
                obj.remove("hala");
            }
        }
    }

    if obj.get("status").map(Value::is_null).unwrap_or(true) {
        obj.insert("status".to_string(), Value::String("sprawna".to_string()));
    }

    match serde_json::from_value::<Machine>(Value::Object(obj)) {
        Ok(machine) => Some(machine),
        Err(e) => {
            tracing::warn!(path = %source.display(), machine_id = %id, error = %e, "机器记录格式错误，已跳过");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ==========================================
// 排序与合并
// ==========================================

/// id 排序: 先比较长度，再比较字典序（"2" < "10"）
pub fn compare_machine_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

pub fn sort_machines(mut machines: Vec<Machine>) -> Vec<Machine> {
    machines.sort_by(|a, b| compare_machine_ids(&a.id, &b.id));
    machines
}

/// 合并主文件与旧文件（主文件优先）
pub fn merge_unique(primary: Vec<Machine>, legacy: Vec<Machine>) -> Vec<Machine> {
    let mut merged = primary;
    for machine in legacy {
        if merged.iter().any(|m| m.id == machine.id) {
            tracing::info!(machine_id = %machine.id, "旧文件中的机器与主文件重复，已被主文件覆盖");
            continue;
        }
        merged.push(machine);
    }
    sort_machines(merged)
}
