// ==========================================
// Warsztat Menager - 配置层
// ==========================================
// 职责: 系统配置加载与类型化快照
// 存储: config.json（嵌套对象，按点分键访问）
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, AppConfig, ConfigManager, HallConfig, MagazynConfig, CONFIG_FILE};
