// ==========================================
// 商业地产资管系统 - 数据仓储层
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

pub mod error;
pub mod import_file_repo;
pub mod journal_repo;
pub mod period_repo;
pub mod record_store;

// 重导出核心类型
pub use error::{RepositoryError, RepositoryResult};
pub use import_file_repo::ImportFileRepository;
pub use journal_repo::JournalRepository;
pub use period_repo::PeriodRepository;
pub use record_store::{
    RecordStore, RowWrite, RowWriteOutcome, SqliteRecordStore, StoredRow,
};
