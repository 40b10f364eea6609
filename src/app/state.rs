// ==========================================
// Warsztat Menager - 应用状态
// ==========================================
// 职责: 加载配置，组装仓储、规划器与 API 实例
// 说明: 配置只在这里读取一次，以 AppConfig 值传入各组件
// ==========================================

use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::api::{ApiResult, MaterialApi};
use crate::config::{AppConfig, ConfigManager, CONFIG_FILE};
use crate::engine::bom::BomPlanner;
use crate::engine::hall_controller::HallController;
use crate::engine::host::{HallView, HostScheduler};
use crate::repository::{CatalogStore, LayoutStore, MachineStore, StockStore};

/// 数据目录环境变量
pub const DATA_DIR_ENV: &str = "WARSZTAT_DATA_DIR";

/// 应用状态
pub struct AppState {
    /// 数据目录
    pub data_dir: PathBuf,

    /// 配置快照
    pub config: AppConfig,

    /// 物料 API
    pub material_api: MaterialApi,

    /// 机器仓储
    pub machine_store: MachineStore,

    /// 车间 / 墙体仓储
    pub layout_store: LayoutStore,
}

impl AppState {
    /// 创建新的 AppState 实例
    ///
    /// # 参数
    /// - data_dir: 数据目录（produkty/、polprodukty/、magazyn/、maszyny.json 等）
    ///
    /// # 返回
    /// - Err: 配置文件格式错误
    pub fn new(data_dir: impl Into<PathBuf>) -> ApiResult<Self> {
        let data_dir = data_dir.into();
        tracing::info!(data_dir = %data_dir.display(), "初始化 AppState");

        let config = ConfigManager::load(data_dir.join(CONFIG_FILE))?.snapshot();
        Ok(Self::with_config(data_dir, config))
    }

    /// 使用给定配置创建（不读取配置文件）
    pub fn with_config(data_dir: impl Into<PathBuf>, config: AppConfig) -> Self {
        let data_dir = data_dir.into();

        let planner = BomPlanner::new(
            CatalogStore::new(&data_dir),
            StockStore::new(&data_dir),
            config.magazyn.alert_procent,
        );

        Self {
            material_api: MaterialApi::new(planner),
            machine_store: MachineStore::new(&data_dir),
            layout_store: LayoutStore::new(&data_dir),
            config,
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 组装车间视图控制器
    ///
    /// 按配置的数据源加载机器，加载墙体与车间，并启用持久化
    pub fn hall_controller(
        &self,
        scheduler: Rc<dyn HostScheduler>,
        view: Rc<dyn HallView>,
    ) -> HallController {
        let loaded = self.machine_store.load(self.config.hall.machine_source);
        let walls = self.layout_store.load_walls();
        let halls = self.layout_store.load_halls();

        HallController::new(
            self.config.hall.clone(),
            loaded.machines,
            walls,
            scheduler,
            view,
        )
        .with_halls(halls)
        .with_store(self.machine_store.clone())
    }
}

/// 获取默认数据目录
///
/// 优先级: 环境变量 WARSZTAT_DATA_DIR → 用户数据目录 → ./data
pub fn get_default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let path = data_dir.join("warsztat-menager-dev");
        #[cfg(not(debug_assertions))]
        let path = data_dir.join("warsztat-menager");

        match std::fs::create_dir_all(&path) {
            Ok(()) => return path,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "无法创建用户数据目录，回退到 ./data");
            }
        }
    }

    PathBuf::from("./data")
}
