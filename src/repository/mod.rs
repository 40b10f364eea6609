// ==========================================
// Warsztat Menager - 数据仓储层
// ==========================================
// 职责: JSON 文件读写、格式规范化、必填字段校验
// 红线: Repository 不含业务逻辑
// ==========================================

pub mod catalog_repo;
pub mod error;
pub mod json_file;
pub mod layout_repo;
pub mod machine_repo;
pub mod stock_repo;

pub use catalog_repo::CatalogStore;
pub use error::{RepositoryError, RepositoryResult};
pub use layout_repo::LayoutStore;
pub use machine_repo::{MachineLoadResult, MachineStore};
pub use stock_repo::StockStore;
