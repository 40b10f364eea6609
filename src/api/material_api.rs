// ==========================================
// Warsztat Menager - 物料 API
// ==========================================
// 职责: 供订单模块调用的物料需求查询（含显示用舍入）
// 说明: 引擎内部不舍入；这里输出的行数据保留 3 位小数
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::catalog::ProductQuery;
use crate::domain::stock::StockItem;
use crate::engine::bom::BomPlanner;
use crate::engine::material_check::{round3, MaterialReport};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ==========================================
// 展示行
// ==========================================

/// 半成品需求行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemiRequirementRow {
    pub kod: String,
    pub ilosc: f64,
    pub czynnosci: Vec<String>,
    pub surowiec_typ: String,
    pub surowiec_dlugosc: f64,
}

/// 原材料需求行（附库存）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRequirementRow {
    pub kod: String,
    pub ilosc: f64,
    pub jednostka: String,
    /// 库存量；库存中没有该原材料时为 None
    pub stan: Option<f64>,
}

// ==========================================
// MaterialApi - 物料 API
// ==========================================
pub struct MaterialApi {
    planner: BomPlanner,
}

impl MaterialApi {
    pub fn new(planner: BomPlanner) -> Self {
        Self { planner }
    }

    pub fn planner(&self) -> &BomPlanner {
        &self.planner
    }

    /// 半成品需求（按代码排序，数量保留 3 位小数）
    pub fn semi_requirements(
        &self,
        product_kod: &str,
        quantity: f64,
        version: Option<&str>,
    ) -> ApiResult<Vec<SemiRequirementRow>> {
        let product_kod = validate_code(product_kod)?;
        let semis = self.planner.bom_semi(product_kod, quantity, version)?;
        debug!(product = %product_kod, count = semis.len(), "半成品需求查询");

        Ok(semis
            .into_iter()
            .map(|(kod, req)| SemiRequirementRow {
                kod,
                ilosc: round3(req.ilosc),
                czynnosci: req.czynnosci,
                surowiec_typ: req.surowiec.typ,
                surowiec_dlugosc: req.surowiec.dlugosc,
            })
            .collect())
    }

    /// 原材料需求（按代码排序，数量保留 3 位小数，附当前库存）
    pub fn raw_requirements(
        &self,
        product_kod: &str,
        quantity: f64,
        version: Option<&str>,
    ) -> ApiResult<Vec<RawRequirementRow>> {
        let product_kod = validate_code(product_kod)?;
        let needs = self.planner.raw_for_product(product_kod, quantity, version)?;
        let stock = self.planner.stock().get_stock();

        Ok(needs
            .into_iter()
            .map(|(kod, req)| RawRequirementRow {
                stan: stock.get(&kod).map(|item| item.stan),
                kod,
                ilosc: round3(req.ilosc),
                jednostka: req.jednostka,
            })
            .collect())
    }

    /// 需求计算 + 库存校验（数值不舍入）
    pub fn plan_and_check(
        &self,
        product_kod: &str,
        quantity: f64,
        version: Option<&str>,
    ) -> ApiResult<MaterialReport> {
        let product_kod = validate_code(product_kod)?;
        Ok(self.planner.plan_and_check(product_kod, quantity, version)?)
    }

    /// 需求计算 + 库存校验（按修订号 / 生效日期 / 版本选择产品）
    pub fn plan_and_check_by(
        &self,
        product_kod: &str,
        quantity: f64,
        query: &ProductQuery,
    ) -> ApiResult<MaterialReport> {
        let product_kod = validate_code(product_kod)?;
        Ok(self.planner.plan_and_check_by(product_kod, quantity, query)?)
    }

    /// 产品的全部版本
    pub fn list_versions(&self, product_kod: &str) -> ApiResult<Vec<String>> {
        let product_kod = validate_code(product_kod)?;
        Ok(self.planner.catalog().list_versions(product_kod)?)
    }

    /// 查询单个原材料的库存
    pub fn stock_item(&self, raw_kod: &str) -> ApiResult<StockItem> {
        let raw_kod = validate_code(raw_kod)?;
        self.planner
            .stock()
            .lookup(raw_kod)
            .ok_or_else(|| ApiError::NotFound(format!("surowiec({})不存在", raw_kod)))
    }
}

fn validate_code(kod: &str) -> ApiResult<&str> {
    let trimmed = kod.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("代码不能为空".to_string()));
    }
    Ok(trimmed)
}
