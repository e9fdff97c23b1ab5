// ==========================================
// 商业地产资管系统 - API 层错误类型
// ==========================================
// 职责: 对宿主暴露的统一错误面
// ==========================================

use crate::engine::error::EngineError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API 层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("导入失败: {0}")]
    ImportError(String),

    #[error("期间已关闭: {0}")]
    AlreadyClosed(String),

    #[error("期间已锁定: {0}")]
    PeriodLocked(String),

    #[error("日志条目不可回滚: {0}")]
    NotRestorable(String),

    #[error("记录未找到: {0}")]
    NotFound(String),

    #[error("参数错误: {0}")]
    InvalidInput(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("配置读取失败: {0}")]
    ConfigError(String),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Engine(engine) => engine.into(),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::AlreadyClosed { .. } => ApiError::AlreadyClosed(err.to_string()),
            EngineError::PeriodLocked { .. } => ApiError::PeriodLocked(err.to_string()),
            EngineError::NotClosed { .. } => ApiError::InvalidInput(err.to_string()),
            EngineError::NotRestorable { .. } => ApiError::NotRestorable(err.to_string()),
            EngineError::RecordNotFound { .. } => ApiError::NotFound(err.to_string()),
            EngineError::Repository(repo) => repo.into(),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
