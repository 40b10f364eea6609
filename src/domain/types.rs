// ==========================================
// Warsztat Menager - 领域类型定义
// ==========================================
// 机器状态 / 编辑模式 / 机器数据源模式
// 序列化格式: 小写 (与 JSON 数据文件一致)
// ==========================================

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ==========================================
// 机器状态 (Machine Status)
// ==========================================
// 持久化值: sprawna / modyfikacja / awaria / serwis
// 读取时忽略大小写 (旧数据中存在 "AWARIA" / "SERWIS")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Sprawna,     // 正常运行
    Modyfikacja, // 改造中
    Awaria,      // 故障
    Serwis,      // 维修中
}

impl MachineStatus {
    /// 从字符串解析状态（忽略大小写与首尾空白）
    ///
    /// # 返回
    /// - Some(status): 合法状态
    /// - None: 未知状态值
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sprawna" => Some(MachineStatus::Sprawna),
            "modyfikacja" => Some(MachineStatus::Modyfikacja),
            "awaria" => Some(MachineStatus::Awaria),
            "serwis" => Some(MachineStatus::Serwis),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Sprawna => "sprawna",
            MachineStatus::Modyfikacja => "modyfikacja",
            MachineStatus::Awaria => "awaria",
            MachineStatus::Serwis => "serwis",
        }
    }
}

impl fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl<'de> Deserialize<'de> for MachineStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        MachineStatus::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("未知的机器状态: {}", raw))
        })
    }
}

// ==========================================
// 编辑模式 (Edit Mode)
// ==========================================
// 车间视图控制器的交互模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditMode {
    #[default]
    Select, // 选择
    Move,   // 拖动
    Add,    // 新增
    Delete, // 删除
}

impl EditMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "select" => Some(EditMode::Select),
            "move" => Some(EditMode::Move),
            "add" => Some(EditMode::Add),
            "delete" => Some(EditMode::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for EditMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditMode::Select => write!(f, "select"),
            EditMode::Move => write!(f, "move"),
            EditMode::Add => write!(f, "add"),
            EditMode::Delete => write!(f, "delete"),
        }
    }
}

// ==========================================
// 机器数据源模式 (Machine Source Mode)
// ==========================================
// auto: 主文件与旧文件合并 (主文件优先)
// primary / legacy: 只读取指定文件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineSourceMode {
    #[default]
    Auto,
    Primary,
    Legacy,
}

impl MachineSourceMode {
    /// 从字符串解析，未知值回退为 Auto
    pub fn parse_or_auto(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "primary" => MachineSourceMode::Primary,
            "legacy" => MachineSourceMode::Legacy,
            _ => MachineSourceMode::Auto,
        }
    }
}

impl fmt::Display for MachineSourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MachineSourceMode::Auto => write!(f, "auto"),
            MachineSourceMode::Primary => write!(f, "primary"),
            MachineSourceMode::Legacy => write!(f, "legacy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_status_parse_ignores_case() {
        assert_eq!(MachineStatus::parse("AWARIA"), Some(MachineStatus::Awaria));
        assert_eq!(MachineStatus::parse(" Serwis "), Some(MachineStatus::Serwis));
        assert_eq!(MachineStatus::parse("zepsuta"), None);
    }

    #[test]
    fn test_machine_status_serde_lowercase() {
        let json = serde_json::to_string(&MachineStatus::Modyfikacja).unwrap();
        assert_eq!(json, "\"modyfikacja\"");

        let parsed: MachineStatus = serde_json::from_str("\"AWARIA\"").unwrap();
        assert_eq!(parsed, MachineStatus::Awaria);
    }

    #[test]
    fn test_source_mode_fallback() {
        assert_eq!(MachineSourceMode::parse_or_auto("legacy"), MachineSourceMode::Legacy);
        assert_eq!(MachineSourceMode::parse_or_auto("???"), MachineSourceMode::Auto);
    }
}
