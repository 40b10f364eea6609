// ==========================================
// Warsztat Menager - 物料校验引擎
// ==========================================
// 原材料需求 × 库存快照 → 缺料 / 预警报告
// 规则（按顺序，命中即停）:
//   1. 库存无该原材料        → alert  (absent), ok=false
//   2. 需求 > 库存            → alert  (short),  ok=false
//   3. 库存 - 需求 < 预警阈值 → warning (near threshold)
//   4. 其余静默
// ==========================================

use crate::domain::stock::StockSnapshot;
use crate::engine::bom::RawNeeds;
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};

/// 告警类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlertKind {
    /// 库存中不存在
    Absent,
    /// 库存不足
    Short { missing: f64 },
    /// 扣减后低于预警阈值
    NearThreshold { remaining: f64, threshold: f64 },
}

/// 单条告警 / 预警
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialAlert {
    pub kod: String,
    #[serde(flatten)]
    pub kind: AlertKind,
    /// 面向用户的提示文本
    pub message: String,
}

impl MaterialAlert {
    fn new(kod: &str, kind: AlertKind, jednostka: &str) -> Self {
        let message = match &kind {
            AlertKind::Absent => t_with_args("material.absent", &[("kod", kod)]),
            AlertKind::Short { missing } => t_with_args(
                "material.short",
                &[
                    ("kod", kod),
                    ("missing", &format_amount(*missing)),
                    ("unit", jednostka),
                ],
            ),
            AlertKind::NearThreshold { remaining, threshold } => t_with_args(
                "material.near_threshold",
                &[
                    ("kod", kod),
                    ("remaining", &format_amount(*remaining)),
                    ("threshold", &format_amount(*threshold)),
                    ("unit", jednostka),
                ],
            ),
        };
        Self {
            kod: kod.to_string(),
            kind,
            message,
        }
    }
}

/// 物料校验报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialReport {
    pub needs: RawNeeds,
    /// 无 alert 时为 true（warning 不影响）
    pub ok: bool,
    pub alerts: Vec<MaterialAlert>,
    pub warnings: Vec<MaterialAlert>,
}

// ==========================================
// MaterialChecker - 物料校验
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct MaterialChecker {
    alert_procent: u32,
}

impl MaterialChecker {
    /// # 参数
    /// - alert_procent: 库存记录无 prog_alertu 时，阈值 = stan × alert_procent / 100
    pub fn new(alert_procent: u32) -> Self {
        Self { alert_procent }
    }

    pub fn alert_procent(&self) -> u32 {
        self.alert_procent
    }

    /// 校验原材料需求
    ///
    /// # 返回
    /// 报告中 alerts / warnings 按原材料代码排序
    pub fn check(&self, needs: RawNeeds, stock: &StockSnapshot) -> MaterialReport {
        let mut alerts = Vec::new();
        let mut warnings = Vec::new();

        for (kod, need) in &needs {
            let Some(item) = stock.get(kod) else {
                tracing::warn!(kod = %kod, "原材料不在库存中");
                alerts.push(MaterialAlert::new(kod, AlertKind::Absent, &need.jednostka));
                continue;
            };

            if need.ilosc > item.stan {
                let missing = need.ilosc - item.stan;
                tracing::warn!(kod = %kod, need = need.ilosc, stan = item.stan, "原材料库存不足");
                alerts.push(MaterialAlert::new(
                    kod,
                    AlertKind::Short { missing },
                    &need.jednostka,
                ));
                continue;
            }

            let remaining = item.stan - need.ilosc;
            let threshold = item.effective_threshold(self.alert_procent);
            if remaining < threshold {
                tracing::info!(kod = %kod, remaining, threshold, "原材料扣减后低于预警阈值");
                warnings.push(MaterialAlert::new(
                    kod,
                    AlertKind::NearThreshold { remaining, threshold },
                    &need.jednostka,
                ));
            }
        }

        MaterialReport {
            ok: alerts.is_empty(),
            needs,
            alerts,
            warnings,
        }
    }
}

/// 数量显示: 最多 3 位小数，去掉末尾 0
pub fn format_amount(value: f64) -> String {
    let text = format!("{:.3}", round3(value));
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// 四舍五入到 3 位小数（仅用于显示）
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stock::StockItem;
    use crate::engine::bom::RawRequirement;

    fn need(ilosc: f64) -> RawRequirement {
        RawRequirement {
            ilosc,
            jednostka: "mb".to_string(),
        }
    }

    fn stock() -> StockSnapshot {
        StockSnapshot::from([
            ("SR001".to_string(), StockItem::new(120.0, "mb", 10.0)),
            ("SR002".to_string(), StockItem::new(60.0, "mb", 5.0)),
        ])
    }

    #[test]
    fn test_warning_does_not_fail_report() {
        let needs = RawNeeds::from([("SR001".to_string(), need(115.0)), ("SR002".to_string(), need(1.0))]);
        let report = MaterialChecker::new(10).check(needs, &stock());

        assert!(report.ok);
        assert!(report.alerts.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].kod, "SR001");
        assert_eq!(
            report.warnings[0].kind,
            AlertKind::NearThreshold { remaining: 5.0, threshold: 10.0 }
        );
    }

    #[test]
    fn test_short_and_absent() {
        let needs = RawNeeds::from([("SR002".to_string(), need(100.0)), ("SR999".to_string(), need(1.0))]);
        let report = MaterialChecker::new(10).check(needs, &stock());

        assert!(!report.ok);
        assert_eq!(report.alerts.len(), 2);
        assert_eq!(report.alerts[0].kind, AlertKind::Short { missing: 40.0 });
        assert_eq!(report.alerts[1].kind, AlertKind::Absent);
        assert!(report.alerts[1].message.contains("SR999"));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_exact_stock_is_not_short() {
        let mut snapshot = stock();
        snapshot.insert("SR003".to_string(), StockItem::new(7.0, "szt", 0.0));
        let needs = RawNeeds::from([("SR003".to_string(), need(7.0))]);
        let report = MaterialChecker::new(10).check(needs, &snapshot);
        assert!(report.ok);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_threshold_fallback_percent() {
        let mut snapshot = StockSnapshot::new();
        let mut item = StockItem::new(100.0, "kg", 0.0);
        item.prog_alertu = None;
        snapshot.insert("SR1".to_string(), item);

        // 100 - 91 = 9 < 100 * 10%
        let needs = RawNeeds::from([("SR1".to_string(), need(91.0))]);
        let report = MaterialChecker::new(10).check(needs, &snapshot);
        assert!(report.ok);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1.2240000001), "1.224");
        assert_eq!(format_amount(5.0), "5");
        assert_eq!(format_amount(0.0004), "0");
        assert_eq!(format_amount(40.5), "40.5");
    }
}
