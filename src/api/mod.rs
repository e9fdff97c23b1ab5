// ==========================================
// 商业地产资管系统 - API 层
// ==========================================
// 职责: 对宿主暴露的业务接口
// ==========================================

pub mod error;
pub mod import_api;
pub mod journal_api;
pub mod period_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
pub use journal_api::JournalApi;
pub use period_api::PeriodApi;
