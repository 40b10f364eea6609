// ==========================================
// Warsztat Menager - BOM 展开引擎
// ==========================================
// 产品 × 数量 → 半成品需求 → 原材料需求
// 计算: 全部使用 f64，规划器内部不做舍入
// 损耗: 每个半成品层只计一次，跨产品不叠加
// ==========================================

use crate::domain::catalog::{ProductQuery, RawMaterialSpec, SemiProduct};
use crate::domain::stock::StockSnapshot;
use crate::engine::error::{PlanError, PlanResult};
use crate::engine::material_check::{MaterialChecker, MaterialReport};
use crate::repository::{CatalogStore, StockStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// 输出类型
// ==========================================

/// 半成品需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemiRequirement {
    pub ilosc: f64,
    pub czynnosci: Vec<String>,
    pub surowiec: RawMaterialSpec,
}

/// 原材料需求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRequirement {
    pub ilosc: f64,
    pub jednostka: String,
}

/// 半成品代码 → 需求
pub type SemiNeeds = BTreeMap<String, SemiRequirement>;
/// 原材料代码 → 需求
pub type RawNeeds = BTreeMap<String, RawRequirement>;

// ==========================================
// BomPlanner - BOM 展开引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct BomPlanner {
    catalog: CatalogStore,
    stock: StockStore,
    checker: MaterialChecker,
}

impl BomPlanner {
    /// 构造函数
    ///
    /// # 参数
    /// - catalog: 产品目录（只读）
    /// - stock: 库存（只读，用于单位解析与缺料校验）
    /// - alert_procent: 库存记录无预警阈值时的百分比阈值
    pub fn new(catalog: CatalogStore, stock: StockStore, alert_procent: u32) -> Self {
        Self {
            catalog,
            stock,
            checker: MaterialChecker::new(alert_procent),
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn stock(&self) -> &StockStore {
        &self.stock
    }

    // ==========================================
    // (a) 产品 → 半成品
    // ==========================================

    /// 计算产品所需半成品
    ///
    /// # 规则
    /// - ilosc = ilosc_na_szt × quantity
    /// - czynnosci / surowiec 原样复制
    ///
    /// # 错误
    /// - InvalidQuantity: quantity <= 0
    /// - NotFound / MissingField: 来自目录
    pub fn bom_semi(
        &self,
        product_kod: &str,
        quantity: f64,
        version: Option<&str>,
    ) -> PlanResult<SemiNeeds> {
        self.bom_semi_by(product_kod, quantity, &ProductQuery::for_version(version))
    }

    /// 同 bom_semi，按完整查询条件（修订号 / 生效日期 / 版本）选择产品
    #[instrument(skip(self, query), fields(product = %product_kod, query = %query))]
    pub fn bom_semi_by(
        &self,
        product_kod: &str,
        quantity: f64,
        query: &ProductQuery,
    ) -> PlanResult<SemiNeeds> {
        ensure_positive(quantity)?;
        let product = self.catalog.find_product(product_kod, query)?;

        let mut result = SemiNeeds::new();
        for line in product.polprodukty {
            let requirement = SemiRequirement {
                ilosc: line.ilosc_na_szt * quantity,
                czynnosci: line.czynnosci,
                surowiec: line.surowiec,
            };
            if result.insert(line.kod.clone(), requirement).is_some() {
                tracing::warn!(
                    product = %product.kod,
                    semi = %line.kod,
                    "产品中半成品代码重复，后一行覆盖前一行"
                );
            }
        }
        tracing::debug!(count = result.len(), "半成品需求计算完成");
        Ok(result)
    }

    // ==========================================
    // (b) 半成品 → 原材料
    // ==========================================

    /// 计算半成品所需原材料
    ///
    /// # 规则
    /// - qty = sr.ilosc_na_szt × quantity × (1 + norma_strat_proc / 100)
    /// - 负损耗按 0 处理并告警
    /// - 单位: 库存记录 → 半成品 surowiec.jednostka → MissingUnit
    pub fn raw_for_semi(&self, semi_kod: &str, quantity: f64) -> PlanResult<RawNeeds> {
        ensure_positive(quantity)?;
        let stock = self.stock.get_stock();
        let (kod, requirement) = self.raw_for_semi_with(semi_kod, quantity, &stock)?;
        Ok(RawNeeds::from([(kod, requirement)]))
    }

    // ==========================================
    // (c) 产品 → 原材料（聚合）
    // ==========================================

    /// 计算产品所需原材料（按原材料代码汇总）
    ///
    /// # 规则
    /// - 先 (a) 后 (b)，相同原材料 ilosc 累加
    /// - 单位以第一条贡献为准，后续不一致时报 UnitConflict
    pub fn raw_for_product(
        &self,
        product_kod: &str,
        quantity: f64,
        version: Option<&str>,
    ) -> PlanResult<RawNeeds> {
        self.raw_for_product_by(product_kod, quantity, &ProductQuery::for_version(version))
    }

    #[instrument(skip(self, query), fields(product = %product_kod, query = %query))]
    pub fn raw_for_product_by(
        &self,
        product_kod: &str,
        quantity: f64,
        query: &ProductQuery,
    ) -> PlanResult<RawNeeds> {
        let stock = self.stock.get_stock();
        self.raw_for_product_with(product_kod, quantity, query, &stock)
    }

    // ==========================================
    // (d) 规划 + 库存校验
    // ==========================================

    /// 计算原材料需求并与库存比对
    ///
    /// 库存只读取一次，单位解析与缺料校验使用同一快照
    pub fn plan_and_check(
        &self,
        product_kod: &str,
        quantity: f64,
        version: Option<&str>,
    ) -> PlanResult<MaterialReport> {
        self.plan_and_check_by(product_kod, quantity, &ProductQuery::for_version(version))
    }

    #[instrument(skip(self, query), fields(product = %product_kod, query = %query))]
    pub fn plan_and_check_by(
        &self,
        product_kod: &str,
        quantity: f64,
        query: &ProductQuery,
    ) -> PlanResult<MaterialReport> {
        let stock = self.stock.get_stock();
        let needs = self.raw_for_product_with(product_kod, quantity, query, &stock)?;
        let report = self.checker.check(needs, &stock);
        tracing::info!(
            ok = report.ok,
            alerts = report.alerts.len(),
            warnings = report.warnings.len(),
            "物料校验完成"
        );
        Ok(report)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn raw_for_product_with(
        &self,
        product_kod: &str,
        quantity: f64,
        query: &ProductQuery,
        stock: &StockSnapshot,
    ) -> PlanResult<RawNeeds> {
        let semis = self.bom_semi_by(product_kod, quantity, query)?;

        let mut result = RawNeeds::new();
        for (semi_kod, semi) in &semis {
            // ilosc_na_szt 为 0 的行不产生原材料需求
            if semi.ilosc <= 0.0 {
                tracing::debug!(semi = %semi_kod, "半成品需求为 0，跳过原材料计算");
                continue;
            }
            let (raw_kod, contribution) = self.raw_for_semi_with(semi_kod, semi.ilosc, stock)?;
            match result.get_mut(&raw_kod) {
                None => {
                    result.insert(raw_kod, contribution);
                }
                Some(existing) => {
                    if existing.jednostka != contribution.jednostka {
                        return Err(PlanError::UnitConflict {
                            kod: raw_kod,
                            first: existing.jednostka.clone(),
                            other: contribution.jednostka,
                        });
                    }
                    existing.ilosc += contribution.ilosc;
                }
            }
        }
        Ok(result)
    }

    fn raw_for_semi_with(
        &self,
        semi_kod: &str,
        quantity: f64,
        stock: &StockSnapshot,
    ) -> PlanResult<(String, RawRequirement)> {
        ensure_positive(quantity)?;
        let semi = self.catalog.get_semi_product(semi_kod)?;

        let loss = effective_loss(&semi);
        let ilosc = semi.surowiec.ilosc_na_szt * quantity * (1.0 + loss / 100.0);
        let jednostka = resolve_unit(&semi, stock)?;

        Ok((semi.surowiec.kod, RawRequirement { ilosc, jednostka }))
    }
}

/// 数量校验（NaN 同样拒绝）
fn ensure_positive(quantity: f64) -> PlanResult<()> {
    if quantity > 0.0 {
        Ok(())
    } else {
        Err(PlanError::InvalidQuantity(quantity))
    }
}

/// 损耗百分比；负值按 0 处理
fn effective_loss(semi: &SemiProduct) -> f64 {
    if semi.norma_strat_proc < 0.0 {
        tracing::warn!(
            semi = %semi.kod,
            norma_strat_proc = semi.norma_strat_proc,
            "损耗百分比为负，按 0 处理"
        );
        0.0
    } else {
        semi.norma_strat_proc
    }
}

/// 单位解析: 库存 → 半成品定义
fn resolve_unit(semi: &SemiProduct, stock: &StockSnapshot) -> PlanResult<String> {
    let raw_kod = &semi.surowiec.kod;
    if let Some(unit) = stock.get(raw_kod).and_then(|item| item.unit()) {
        return Ok(unit.to_string());
    }
    semi.surowiec
        .jednostka
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PlanError::MissingUnit {
            kod: raw_kod.clone(),
        })
}
