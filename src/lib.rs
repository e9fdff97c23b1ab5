// ==========================================
// 商业地产资管系统 - 数据导入与审计核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 宿主应用的进程内库(无网络面、无 UI)
// 职责: 异构表格导入 → 校验评分 → 事务化落库
//       + 期间锁治理 + 只追加审计日志
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 期间锁治理 + 提交引擎
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施(连接初始化/PRAGMA/建表统一)
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ClosedPeriod, DomainRecord, FieldType, FieldValue, ImportCategory, ImportFile, ImportStage,
    ImportStatus, JournalAction, JournalEntry, JournalFilter, JournalStats, PeriodKey, RawTable,
    RowIssue, Severity, ValidationResult,
};

// 导入层
pub use importer::{
    ColumnMapping, FileFormat, ImportError, ImportSession, MappingResolver, StartImportRequest,
};

// 引擎层
pub use engine::{
    CancelToken, CommitContext, CommitEngine, CommitOutcome, EngineError, ImportEvent,
    LockGovernor, NoOpProgressSink, ProgressSink,
};

// API
pub use api::{ApiError, ImportApi, JournalApi, PeriodApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "商业地产资管系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
