// ==========================================
// Warsztat Menager - 库存实体
// ==========================================
// 以原材料代码为键: {stan, jednostka, prog_alertu}
// 单位以库存记录为准
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个原材料的库存记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    #[serde(default)]
    pub nazwa: Option<String>,
    /// 当前库存（非负）
    pub stan: f64,
    #[serde(default)]
    pub jednostka: Option<String>,
    /// 预警阈值（非负）；缺失时由 magazyn.alert_procent 推导
    #[serde(default)]
    pub prog_alertu: Option<f64>,
}

impl StockItem {
    pub fn new(stan: f64, jednostka: &str, prog_alertu: f64) -> Self {
        Self {
            nazwa: None,
            stan,
            jednostka: Some(jednostka.to_string()),
            prog_alertu: Some(prog_alertu),
        }
    }

    /// 有效单位（空串视为缺失）
    pub fn unit(&self) -> Option<&str> {
        self.jednostka
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// 有效预警阈值
    ///
    /// # 参数
    /// - alert_procent: 记录未给出 prog_alertu 时，按库存的百分比推导
    pub fn effective_threshold(&self, alert_procent: u32) -> f64 {
        match self.prog_alertu {
            Some(v) => v,
            None => self.stan * f64::from(alert_procent) / 100.0,
        }
    }
}

/// 库存快照（按原材料代码有序）
pub type StockSnapshot = BTreeMap<String, StockItem>;
