// ==========================================
// 商业地产资管系统 - 引擎层
// ==========================================
// 职责: 期间锁治理 + 提交引擎 + 进度事件
// ==========================================

pub mod commit_engine;
pub mod error;
pub mod events;
pub mod lock_governor;

// 重导出核心类型
pub use commit_engine::{CommitContext, CommitEngine, CommitOutcome};
pub use error::{EngineError, EngineResult};
pub use events::{
    CancelToken, CollectingProgressSink, ImportEvent, NoOpProgressSink, ProgressSink,
};
pub use lock_governor::LockGovernor;
