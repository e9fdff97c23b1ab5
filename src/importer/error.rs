// ==========================================
// 商业地产资管系统 - 导入层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::ImportStage;
use thiserror::Error;

/// 导入层错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 解析阶段(致命,不创建会话) =====
    #[error("文件格式不支持: {0}（仅支持 xlsx / 分隔文本 / JSON 数组）")]
    UnsupportedFormat(String),

    #[error("文件无数据行")]
    EmptyFile,

    #[error("工作簿解析失败: {0}")]
    WorkbookParseError(String),

    #[error("分隔文本解析失败: {0}")]
    DelimitedParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 映射阶段 =====
    #[error("未知源列: {0}")]
    UnknownSourceColumn(String),

    #[error("未知目标字段: {0}")]
    UnknownTargetField(String),

    // ===== 会话状态机 =====
    #[error("当前阶段 {actual} 不允许该操作（期望 {expected}）")]
    InvalidStage { expected: &'static str, actual: &'static str },

    #[error("校验未通过且未确认强制放行（错误 {error_count} 条）")]
    ValidationNotConfirmed { error_count: usize },

    #[error("存在必填字段违规,不允许强制放行")]
    RequiredViolationNotOverridable,

    // ===== 提交阶段透传 =====
    #[error(transparent)]
    Engine(#[from] crate::engine::error::EngineError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 阶段校验辅助
    pub fn invalid_stage(expected: ImportStage, actual: ImportStage) -> Self {
        ImportError::InvalidStage {
            expected: expected.as_str(),
            actual: actual.as_str(),
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::InternalError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::DelimitedParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
