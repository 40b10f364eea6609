// ==========================================
// Warsztat Menager - 物料需求命令行工具
// ==========================================
// 用法:
//   plan_materials <产品代码> <数量> [版本|-] [数据目录] [--rev N] [--date YYYY-MM-DD]
// 数据目录缺省: WARSZTAT_DATA_DIR → 用户数据目录 → ./data
// ==========================================

use anyhow::{bail, Context};
use chrono::NaiveDate;
use warsztat_menager::app::{get_default_data_dir, AppState};
use warsztat_menager::domain::ProductQuery;
use warsztat_menager::engine::material_check::format_amount;
use warsztat_menager::logging;

const USAGE: &str =
    "usage: plan_materials <product> <quantity> [version|-] [data_dir] [--rev N] [--date YYYY-MM-DD]";

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut positional = Vec::new();
    let mut query = ProductQuery::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rev" => {
                let raw = args.next().context("--rev 缺少参数")?;
                query = query.revision(raw.trim().parse().context("--rev 必须是整数")?);
            }
            "--date" => {
                let raw = args.next().context("--date 缺少参数")?;
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .context("--date 格式应为 YYYY-MM-DD")?;
                query = query.at_date(date);
            }
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(product) = positional.next() else {
        bail!(USAGE);
    };
    let quantity: f64 = positional
        .next()
        .context(USAGE)?
        .parse()
        .context("数量必须是数字")?;
    if let Some(version) = positional
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "-")
    {
        query = query.version(&version);
    }
    let data_dir = positional.next().map(Into::into).unwrap_or_else(get_default_data_dir);

    let state = AppState::new(data_dir)?;
    let report = state.material_api.plan_and_check_by(&product, quantity, &query)?;

    for (kod, need) in &report.needs {
        println!("{}\t{}\t{}", kod, format_amount(need.ilosc), need.jednostka);
    }
    for alert in &report.alerts {
        println!("ALERT\t{}", alert.message);
    }
    for warning in &report.warnings {
        println!("WARN\t{}", warning.message);
    }
    println!("ok={}", report.ok);
    Ok(())
}
