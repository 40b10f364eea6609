// ==========================================
// Warsztat Menager - 产品目录实体
// ==========================================
// 产品 (produkt) → 半成品行 (polprodukt) → 原材料 (surowiec)
// 红线: 这里的类型均已在存储边界完成必填字段校验,
//       算法层不再做字段存在性判断
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ==========================================
// 产品行上的原材料描述
// ==========================================
/// 产品 BOM 行中对原材料的描述（类型 + 下料长度），原样透传给订单模块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterialSpec {
    pub typ: String,
    pub dlugosc: f64,
}

// ==========================================
// 半成品行 (SemiProductLine)
// ==========================================
/// 产品定义中的一行半成品需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemiProductLine {
    /// 半成品代码（引用 SemiProduct）
    pub kod: String,
    /// 每件产品所需半成品数量（非负）
    pub ilosc_na_szt: f64,
    /// 工序列表（非空，有序）
    pub czynnosci: Vec<String>,
    /// 原材料描述
    pub surowiec: RawMaterialSpec,
}

// ==========================================
// 产品 (Product)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub kod: String,
    #[serde(default)]
    pub nazwa: Option<String>,
    /// 版本号（统一为字符串；文件中缺失时为空串）
    pub version: String,
    #[serde(default)]
    pub is_default: bool,
    /// BOM 修订号
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom_revision: Option<i64>,
    /// 生效区间（闭区间，两端可缺省）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<NaiveDate>,
    #[serde(default)]
    pub polprodukty: Vec<SemiProductLine>,
    /// 来源文件路径（用于默认版本的确定性选择）
    #[serde(skip)]
    pub source_path: PathBuf,
}

impl Product {
    /// 默认版本排序键: (version, 来源路径)
    pub fn precedence_key(&self) -> (&str, &PathBuf) {
        (self.version.as_str(), &self.source_path)
    }
}

// ==========================================
// 产品查询条件 (ProductQuery)
// ==========================================
/// 产品定义的选择条件
///
/// 先按 bom_revision 与 at_date（生效区间）过滤候选，
/// 再按 version 精确匹配或默认版本规则选择
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub version: Option<String>,
    pub bom_revision: Option<i64>,
    pub at_date: Option<NaiveDate>,
}

impl ProductQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 仅按版本选择（None 走默认版本规则）
    pub fn for_version(version: Option<&str>) -> Self {
        Self {
            version: version.map(|v| v.trim().to_string()),
            ..Self::default()
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.trim().to_string());
        self
    }

    pub fn revision(mut self, bom_revision: i64) -> Self {
        self.bom_revision = Some(bom_revision);
        self
    }

    pub fn at_date(mut self, date: NaiveDate) -> Self {
        self.at_date = Some(date);
        self
    }

    /// at_date 是否落在 [from, to] 内（缺省端不限制）
    pub fn date_matches(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        let Some(at) = self.at_date else {
            return true;
        };
        from.map_or(true, |f| at >= f) && to.map_or(true, |t| at <= t)
    }
}

impl fmt::Display for ProductQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "version={}", self.version.as_deref().unwrap_or("*"))?;
        if let Some(rev) = self.bom_revision {
            write!(f, ", bom_revision={}", rev)?;
        }
        if let Some(date) = self.at_date {
            write!(f, ", at_date={}", date)?;
        }
        Ok(())
    }
}

// ==========================================
// 半成品 (SemiProduct)
// ==========================================
/// 半成品所消耗的原材料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemiProductMaterial {
    /// 原材料代码
    pub kod: String,
    /// 每件半成品消耗的原材料数量
    pub ilosc_na_szt: f64,
    /// 计量单位（库存无记录时的备用单位）
    #[serde(default)]
    pub jednostka: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemiProduct {
    pub kod: String,
    #[serde(default)]
    pub nazwa: Option<String>,
    pub surowiec: SemiProductMaterial,
    /// 损耗百分比，缺省 0
    #[serde(default)]
    pub norma_strat_proc: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_date_window_inclusive() {
        let q = ProductQuery::new().at_date(d("2024-06-01"));
        assert!(q.date_matches(Some(d("2024-06-01")), Some(d("2024-06-01"))));
        assert!(q.date_matches(None, None));
        assert!(!q.date_matches(Some(d("2024-06-02")), None));
        assert!(!q.date_matches(None, Some(d("2024-05-31"))));
        assert!(ProductQuery::new().date_matches(Some(d("2030-01-01")), None));
    }

    #[test]
    fn test_query_display() {
        let q = ProductQuery::for_version(Some(" 2 ")).revision(3);
        assert_eq!(q.to_string(), "version=2, bom_revision=3");
        assert_eq!(ProductQuery::new().to_string(), "version=*");
    }
}
