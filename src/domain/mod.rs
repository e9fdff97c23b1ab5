// ==========================================
// 商业地产资管系统 - 领域层
// ==========================================
// 职责: 实体与类型定义,不含业务流程
// ==========================================

pub mod import_file;
pub mod journal;
pub mod period;
pub mod record;
pub mod schema;
pub mod table;
pub mod types;
pub mod validation;

// 重导出核心类型
pub use import_file::ImportFile;
pub use journal::{JournalDetails, JournalEntry, JournalFilter, JournalStats};
pub use period::{ClosedPeriod, PeriodKey};
pub use record::{DomainRecord, FieldValue};
pub use schema::{BusinessRule, CategorySchema, FieldSpec};
pub use table::RawTable;
pub use types::{
    FieldType, ImportCategory, ImportStage, ImportStatus, JournalAction, Severity,
};
pub use validation::{RowIssue, ValidationResult};
