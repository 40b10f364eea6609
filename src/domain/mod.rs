// ==========================================
// Warsztat Menager - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod hall;
pub mod stock;
pub mod types;

// 重导出核心类型
pub use catalog::{Product, ProductQuery, RawMaterialSpec, SemiProduct, SemiProductLine, SemiProductMaterial};
pub use hall::{Hall, Machine, Point, Route, Wall};
pub use stock::{StockItem, StockSnapshot};
pub use types::{EditMode, MachineSourceMode, MachineStatus};
