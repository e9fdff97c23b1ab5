// ==========================================
// 商业地产资管系统 - 引擎层错误类型
// ==========================================
// 覆盖: 期间锁治理 + 提交引擎
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 期间锁治理 =====
    #[error("期间已关闭: {business_unit_id} {year}-{month:02}")]
    AlreadyClosed {
        business_unit_id: String,
        year: i32,
        month: u32,
    },

    #[error("期间未关闭,无法临时放开: {business_unit_id} {year}-{month:02}")]
    NotClosed {
        business_unit_id: String,
        year: i32,
        month: u32,
    },

    #[error("期间已锁定,禁止写入: {business_unit_id} {year}-{month:02}")]
    PeriodLocked {
        business_unit_id: String,
        year: i32,
        month: u32,
    },

    // ===== 单条变更 =====
    #[error("记录未找到: {table} / {record_id}")]
    RecordNotFound { table: String, record_id: String },

    #[error("日志条目不可回滚 (id={entry_id}): {reason}")]
    NotRestorable { entry_id: i64, reason: String },

    // ===== 存储透传 =====
    #[error(transparent)]
    Repository(#[from] crate::repository::error::RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
