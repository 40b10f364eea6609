// ==========================================
// Warsztat Menager - 命令行入口
// ==========================================
// 无界面运行: 加载配置与数据，输出车间与库存概况
// 界面由宿主 GUI 通过 app::AppState 组装
// ==========================================

use std::rc::Rc;

use warsztat_menager::app::{get_default_data_dir, AppState};
use warsztat_menager::domain::types::MachineStatus;
use warsztat_menager::engine::host::{ManualScheduler, NoOpHallView};
use warsztat_menager::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 版本 {}", warsztat_menager::APP_NAME, warsztat_menager::VERSION);
    tracing::info!("==================================================");

    let data_dir = std::env::args()
        .nth(1)
        .map(Into::into)
        .unwrap_or_else(get_default_data_dir);
    let state = AppState::new(data_dir)?;
    tracing::info!(data_dir = %state.data_dir().display(), "数据目录");

    let scheduler = Rc::new(ManualScheduler::new());
    let controller = state.hall_controller(scheduler, Rc::new(NoOpHallView));
    let machines = controller.machines();

    println!("hale: {}", controller.halls().len());
    println!("maszyny: {}", machines.len());
    for machine in &machines {
        println!(
            "  {}\t{}\t{}\t{}",
            machine.id,
            machine.status,
            machine.pozycja,
            machine.hala.as_deref().unwrap_or("-")
        );
    }
    println!("surowce: {}", state.material_api.planner().stock().get_stock().len());

    let failed = machines
        .iter()
        .filter(|m| m.status == MachineStatus::Awaria)
        .count();
    if failed > 0 {
        tracing::warn!(failed, "存在故障机器");
    }
    Ok(())
}
