//! 多语言 JSON 翻译表格工具库
//!
//! 提供嵌套 JSON 与扁平键路径的双向转换、多语言聚合以及单元格级修改回写
//! 遵循MVVM架构模式：model 负责数据与转换，vm 负责命令桥接

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::catalog::{AggregatedTable, Cell, ScanOutcome};
pub use model::data_core::{AppError, AppState};
pub use model::path_codec::{flatten, unflatten, FlatCatalog};
pub use vm::bridge::{Command, Response, ViewModelBridge};
