// ==========================================
// Warsztat Menager - 应用层
// ==========================================
// 职责: 组装配置、仓储与引擎，供宿主 GUI 与命令行使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_data_dir, AppState, DATA_DIR_ENV};
