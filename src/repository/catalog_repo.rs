// ==========================================
// Warsztat Menager - 产品目录仓储
// ==========================================
// 目录结构:
//   <root>/produkty/*.json      每个文件一个产品版本
//   <root>/polprodukty/<kod>.json 每个文件一个半成品
// 红线: 只读；每次调用重新读取文件，不持有长期句柄
// 红线: 必填字段校验在此完成，引擎层只接收校验后的类型
// ==========================================

use crate::domain::catalog::{
    Product, ProductQuery, RawMaterialSpec, SemiProduct, SemiProductLine, SemiProductMaterial,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::json_file::{read_json_value, scalar_to_f64, scalar_to_string};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const PRODUCTS_DIR: &str = "produkty";
const SEMI_PRODUCTS_DIR: &str = "polprodukty";

// ==========================================
// 文件文档结构（字段均可缺失，校验后转换为领域类型）
// ==========================================

#[derive(Debug, Deserialize)]
struct ProductDocument {
    #[serde(default)]
    kod: Option<Value>,
    #[serde(default)]
    nazwa: Option<String>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    is_default: Option<bool>,
    #[serde(default)]
    polprodukty: Vec<LineDocument>,
}

#[derive(Debug, Deserialize)]
struct LineDocument {
    #[serde(default)]
    kod: Option<Value>,
    #[serde(default)]
    ilosc_na_szt: Option<f64>,
    #[serde(default)]
    czynnosci: Option<Vec<String>>,
    #[serde(default)]
    surowiec: Option<RawSpecDocument>,
}

/// typ / dlugosc 接受任意标量（"200" 与 200 等价）
#[derive(Debug, Deserialize)]
struct RawSpecDocument {
    #[serde(default)]
    typ: Option<Value>,
    #[serde(default)]
    dlugosc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SemiProductDocument {
    #[serde(default)]
    kod: Option<Value>,
    #[serde(default)]
    nazwa: Option<String>,
    #[serde(default)]
    surowiec: Option<SemiMaterialDocument>,
    #[serde(default)]
    norma_strat_proc: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SemiMaterialDocument {
    #[serde(default)]
    kod: Option<Value>,
    #[serde(default)]
    ilosc_na_szt: Option<f64>,
    #[serde(default)]
    jednostka: Option<String>,
}

/// 产品候选（仅解析了表头字段）
struct ProductCandidate {
    path: PathBuf,
    version: String,
    is_default: bool,
    bom_revision: Option<i64>,
    value: Value,
}

// ==========================================
// CatalogStore - 产品目录仓储
// ==========================================
#[derive(Debug, Clone)]
pub struct CatalogStore {
    root: PathBuf,
}

impl CatalogStore {
    /// 创建目录仓储
    ///
    /// # 参数
    /// - root: 目录根路径（包含 produkty/ 与 polprodukty/）
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 查询产品定义（仅按版本选择）
    ///
    /// # 参数
    /// - kod: 产品代码
    /// - version: 指定版本；None 时按默认版本规则选择
    pub fn get_product(&self, kod: &str, version: Option<&str>) -> RepositoryResult<Product> {
        self.find_product(kod, &ProductQuery::for_version(version))
    }

    /// 按查询条件选择产品定义
    ///
    /// # 过滤顺序
    /// 1) bom_revision: 只保留修订号相等的记录
    /// 2) at_date: 只保留 effective_from <= at_date <= effective_to 的记录（缺省端不限制）
    /// 3) version 精确匹配；未指定时按默认版本规则
    ///
    /// # 默认版本规则
    /// 1) 取 is_default=true 的记录；多条时取 (version, 来源路径) 字典序最小者并告警
    /// 2) 无默认记录时，取全部候选中 (version, 来源路径) 最小者
    ///
    /// # 错误
    /// - NotFound: 无此代码、过滤后无候选或无此版本
    /// - Malformed: 参与日期过滤的记录生效日期格式非法
    /// - MissingField / Malformed: 选中的记录不完整
    pub fn find_product(&self, kod: &str, query: &ProductQuery) -> RepositoryResult<Product> {
        let kod = kod.trim();
        let mut candidates = self.product_candidates(kod)?;
        if candidates.is_empty() {
            return Err(RepositoryError::not_found("produkt", kod));
        }

        if let Some(revision) = query.bom_revision {
            candidates.retain(|c| c.bom_revision == Some(revision));
        }
        if query.at_date.is_some() {
            let mut in_window = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                let from = parse_date_field(&candidate.path, &candidate.value, "effective_from")?;
                let to = parse_date_field(&candidate.path, &candidate.value, "effective_to")?;
                if query.date_matches(from, to) {
                    in_window.push(candidate);
                }
            }
            candidates = in_window;
        }
        if candidates.is_empty() {
            tracing::debug!(kod = %kod, query = %query, "过滤后无产品候选");
            return Err(RepositoryError::not_found("produkt", format!("{} [{}]", kod, query)));
        }

        let chosen = match query.version.as_deref() {
            Some(v) => {
                let v = v.trim();
                candidates
                    .into_iter()
                    .find(|c| c.version == v)
                    .ok_or_else(|| RepositoryError::not_found("produkt", format!("{}@{}", kod, v)))?
            }
            None => select_authoritative(kod, candidates)
                .ok_or_else(|| RepositoryError::not_found("produkt", kod))?,
        };

        parse_product(chosen)
    }

    /// 列出产品的全部版本号（排序后）
    pub fn list_versions(&self, kod: &str) -> RepositoryResult<Vec<String>> {
        let mut versions: Vec<String> = self
            .product_candidates(kod.trim())?
            .into_iter()
            .map(|c| c.version)
            .collect();
        versions.sort();
        versions.dedup();
        Ok(versions)
    }

    /// 查询半成品定义
    ///
    /// # 错误
    /// - NotFound: 文件不存在
    /// - MissingField: 缺少 surowiec / surowiec.kod / surowiec.ilosc_na_szt
    /// - Malformed: JSON 非法
    pub fn get_semi_product(&self, kod: &str) -> RepositoryResult<SemiProduct> {
        let kod = kod.trim();
        if kod.is_empty() || kod.contains(['/', '\\']) || kod.contains("..") {
            return Err(RepositoryError::not_found("polprodukt", kod));
        }

        let path = self.root.join(SEMI_PRODUCTS_DIR).join(format!("{}.json", kod));
        let value = read_json_value(&path)?
            .ok_or_else(|| RepositoryError::not_found("polprodukt", kod))?;
        let doc: SemiProductDocument = serde_json::from_value(value)
            .map_err(|e| RepositoryError::malformed(&path, e.to_string()))?;

        let semi_kod = doc
            .kod
            .as_ref()
            .and_then(scalar_to_string)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| kod.to_string());

        let sr = doc
            .surowiec
            .ok_or_else(|| RepositoryError::missing_field("polprodukt", &semi_kod, "surowiec"))?;
        let sr_kod = sr
            .kod
            .as_ref()
            .and_then(scalar_to_string)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RepositoryError::missing_field("polprodukt", &semi_kod, "surowiec.kod"))?;
        let ilosc_na_szt = sr.ilosc_na_szt.ok_or_else(|| {
            RepositoryError::missing_field("polprodukt", &semi_kod, "surowiec.ilosc_na_szt")
        })?;
        if ilosc_na_szt < 0.0 {
            return Err(RepositoryError::malformed(
                &path,
                format!("surowiec.ilosc_na_szt 不能为负: {}", ilosc_na_szt),
            ));
        }

        Ok(SemiProduct {
            kod: semi_kod,
            nazwa: doc.nazwa,
            surowiec: SemiProductMaterial {
                kod: sr_kod,
                ilosc_na_szt,
                jednostka: sr.jednostka,
            },
            norma_strat_proc: doc.norma_strat_proc.unwrap_or(0.0),
        })
    }

    // ==========================================
    // 内部方法
    // ==========================================

    /// 扫描产品目录，收集指定代码的全部候选（按路径排序）
    ///
    /// 无法解析的文件跳过并告警
    fn product_candidates(&self, kod: &str) -> RepositoryResult<Vec<ProductCandidate>> {
        let dir = self.root.join(PRODUCTS_DIR);
        if !dir.exists() {
            tracing::warn!(dir = %dir.display(), "产品目录不存在");
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| RepositoryError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        paths.sort();

        let mut out = Vec::new();
        for path in paths {
            let value = match read_json_value(&path) {
                Ok(Some(v)) => v,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "跳过无法解析的产品文件");
                    continue;
                }
            };
            let matches = value
                .get("kod")
                .and_then(scalar_to_string)
                .map(|k| k == kod)
                .unwrap_or(false);
            if !matches {
                continue;
            }
            let version = value
                .get("version")
                .and_then(scalar_to_string)
                .unwrap_or_default();
            let is_default = value
                .get("is_default")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            let bom_revision = value.get("bom_revision").and_then(Value::as_i64);
            out.push(ProductCandidate {
                path,
                version,
                is_default,
                bom_revision,
                value,
            });
        }
        Ok(out)
    }
}

/// 读取 ISO 日期字段（YYYY-MM-DD）；缺失、null 或空串为 None
fn parse_date_field(path: &Path, value: &Value, field: &str) -> RepositoryResult<Option<NaiveDate>> {
    let raw = match value.get(field) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim(),
        Some(other) => {
            return Err(RepositoryError::malformed(
                path,
                format!("{} 必须是日期字符串: {}", field, other),
            ))
        }
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| RepositoryError::malformed(path, format!("{} 日期格式错误 ({}): {}", field, raw, e)))
}

/// 按默认版本规则选择权威记录
fn select_authoritative(kod: &str, candidates: Vec<ProductCandidate>) -> Option<ProductCandidate> {
    let (defaults, others): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|c| c.is_default);

    if defaults.len() > 1 {
        let versions: Vec<&str> = defaults.iter().map(|c| c.version.as_str()).collect();
        tracing::warn!(
            kod = %kod,
            versions = ?versions,
            "产品存在多个默认版本，取 (version, path) 最小者"
        );
    }

    let pool = if defaults.is_empty() { others } else { defaults };
    pool.into_iter()
        .min_by(|a, b| (&a.version, &a.path).cmp(&(&b.version, &b.path)))
}

/// 校验并转换产品记录
fn parse_product(candidate: ProductCandidate) -> RepositoryResult<Product> {
    let ProductCandidate {
        path,
        version,
        bom_revision,
        value,
        ..
    } = candidate;

    // 未按日期过滤时，非法生效日期不阻止读取
    let lenient_date = |field: &str| match parse_date_field(&path, &value, field) {
        Ok(date) => date,
        Err(e) => {
            tracing::warn!(path = %path.display(), field, error = %e, "生效日期无法解析，已忽略");
            None
        }
    };
    let effective_from = lenient_date("effective_from");
    let effective_to = lenient_date("effective_to");

    let doc: ProductDocument = serde_json::from_value(value)
        .map_err(|e| RepositoryError::malformed(&path, e.to_string()))?;
    let kod = doc
        .kod
        .as_ref()
        .and_then(scalar_to_string)
        .ok_or_else(|| RepositoryError::missing_field("produkt", path.display().to_string(), "kod"))?;

    let mut lines = Vec::with_capacity(doc.polprodukty.len());
    for line in doc.polprodukty {
        lines.push(parse_line(&kod, &path, line)?);
    }

    Ok(Product {
        kod,
        nazwa: doc.nazwa,
        version,
        is_default: doc.is_default.unwrap_or(false),
        bom_revision,
        effective_from,
        effective_to,
        polprodukty: lines,
        source_path: path,
    })
}

/// 校验半成品行: kod, ilosc_na_szt, czynnosci(非空), surowiec{typ, dlugosc}
fn parse_line(product_kod: &str, path: &Path, line: LineDocument) -> RepositoryResult<SemiProductLine> {
    let kod = line
        .kod
        .as_ref()
        .and_then(scalar_to_string)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| RepositoryError::missing_field("produkt", product_kod, "kod"))?;

    let ilosc_na_szt = line
        .ilosc_na_szt
        .ok_or_else(|| RepositoryError::missing_field("produkt", product_kod, "ilosc_na_szt"))?;
    if ilosc_na_szt < 0.0 {
        return Err(RepositoryError::malformed(
            path,
            format!("{}: ilosc_na_szt 不能为负: {}", kod, ilosc_na_szt),
        ));
    }

    // 空工序列表与缺失同样视为错误（区分合法空 BOM 与损坏数据）
    let czynnosci = line
        .czynnosci
        .filter(|c| !c.is_empty())
        .ok_or_else(|| RepositoryError::missing_field("produkt", product_kod, "czynnosci"))?;

    let sr = line
        .surowiec
        .ok_or_else(|| RepositoryError::missing_field("produkt", product_kod, "surowiec"))?;
    let typ = match sr.typ.filter(|v| !v.is_null()) {
        None => return Err(RepositoryError::missing_field("produkt", product_kod, "surowiec.typ")),
        Some(v) => scalar_to_string(&v).ok_or_else(|| {
            RepositoryError::malformed(path, format!("{}: surowiec.typ 必须是标量: {}", kod, v))
        })?,
    };
    let dlugosc = match sr.dlugosc.filter(|v| !v.is_null()) {
        None => {
            return Err(RepositoryError::missing_field("produkt", product_kod, "surowiec.dlugosc"))
        }
        Some(v) => scalar_to_f64(&v).ok_or_else(|| {
            RepositoryError::malformed(path, format!("{}: surowiec.dlugosc 不是数字: {}", kod, v))
        })?,
    };

    Ok(SemiProductLine {
        kod,
        ilosc_na_szt,
        czynnosci,
        surowiec: RawMaterialSpec { typ, dlugosc },
    })
}
