// ==========================================
// Warsztat Menager - 车间布局实体
// ==========================================
// Hall / Machine / Wall / Route
// 坐标单位: 画布像素 (整数)
// ==========================================

use crate::domain::types::MachineStatus;
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ==========================================
// 网格点 (Point)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// 曼哈顿距离
    pub fn manhattan(&self, other: &Point) -> i64 {
        (i64::from(self.x) - i64::from(other.x)).abs()
            + (i64::from(self.y) - i64::from(other.y)).abs()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 技术员路线: 从服务点到机器的有序网格点
pub type Route = Vec<Point>;

// ==========================================
// 车间 (Hall)
// ==========================================
/// 矩形车间，要求 x1 < x2 且 y1 < y2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hall {
    pub nazwa: String,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Hall {
    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x1 && p.x <= self.x2 && p.y >= self.y1 && p.y <= self.y2
    }
}

// ==========================================
// 墙 (Wall)
// ==========================================
/// 墙段：两个端点；路径规划时按网格格子处理
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hala: Option<String>,
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Wall {
    /// 栅格化为被阻挡的网格点
    ///
    /// 覆盖两端点对齐到 step 后的包围盒内全部网格点（端点所在格子包含在内）。
    /// step <= 0 时返回空集合。
    pub fn blocked_cells(&self, step: i32) -> HashSet<Point> {
        let mut cells = HashSet::new();
        if step <= 0 {
            return cells;
        }
        let (cx1, cx2) = ordered(self.x1.div_euclid(step), self.x2.div_euclid(step));
        let (cy1, cy2) = ordered(self.y1.div_euclid(step), self.y2.div_euclid(step));
        for cx in cx1..=cx2 {
            for cy in cy1..=cy2 {
                cells.insert(Point::new(cx * step, cy * step));
            }
        }
        cells
    }
}

fn ordered(a: i32, b: i32) -> (i32, i32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// ==========================================
// 机器 (Machine)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// 规范形式为去除首尾空白后的字符串
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nazwa: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hala: Option<String>,
    pub pozycja: Point,
    pub status: MachineStatus,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_since: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miniatura: Option<String>,
    /// 未建模字段，写回时原样保留
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Machine {
    pub fn new(id: &str, pozycja: Point, status: MachineStatus) -> Self {
        Self {
            id: id.trim().to_string(),
            nazwa: None,
            typ: None,
            hala: None,
            pozycja,
            status,
            status_since: Some(now_timestamp()),
            miniatura: None,
            extra: BTreeMap::new(),
        }
    }

    /// 变更状态并刷新 status_since
    ///
    /// # 返回
    /// - true: 状态发生变化
    /// - false: 状态相同，无操作
    pub fn apply_status(&mut self, status: MachineStatus) -> bool {
        if self.status == status {
            return false;
        }
        self.status = status;
        self.status_since = Some(now_timestamp());
        true
    }

    /// 是否属于指定车间（None 表示不过滤）
    pub fn in_hall(&self, hala: Option<&str>) -> bool {
        match hala {
            None => true,
            Some(h) => self.hala.as_deref() == Some(h),
        }
    }
}

/// 当前本地时间（精确到秒）
pub fn now_timestamp() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// 宽松解析时间戳: 无时区 ISO / RFC3339；无法解析时丢弃并告警
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = trimmed.parse::<NaiveDateTime>() {
        return Ok(Some(ts));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Some(ts.naive_local()));
    }
    tracing::warn!(value = %trimmed, "无法解析 status_since，已忽略");
    Ok(None)
}
