// ==========================================
// 商业地产资管系统 - 导入进度事件发布
// ==========================================
// 职责: 定义进度事件 trait,实现依赖倒置
// 说明: 核心层定义 trait,宿主 UI 实现订阅适配器
// ==========================================

use crate::domain::types::{ImportStage, ImportStatus};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ==========================================
// ImportEvent - 进度事件
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ImportEvent {
    /// 会话阶段切换
    StageChanged {
        stage: ImportStage,
        progress_percent: u8,
    },
    /// 提交进度(按行块推送)
    CommitProgress {
        done: usize,
        total: usize,
        progress_percent: u8,
    },
    /// 终态
    Terminal {
        status: ImportStatus,
        rows_affected: i64,
        error_summary: Option<String>,
    },
}

// ==========================================
// ProgressSink Trait - 进度事件接收方
// ==========================================
// 宿主 UI 实现此 trait 渲染进度条;核心层只管推送
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ImportEvent);
}

/// 空操作接收方(不需要进度展示的场景,如单元测试)
#[derive(Debug, Clone, Default)]
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn emit(&self, event: ImportEvent) {
        tracing::debug!(?event, "NoOpProgressSink: 丢弃进度事件");
    }
}

/// 收集型接收方(测试断言事件序列用)
#[derive(Debug, Default)]
pub struct CollectingProgressSink {
    events: Mutex<Vec<ImportEvent>>,
}

impl CollectingProgressSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ImportEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressSink for CollectingProgressSink {
    fn emit(&self, event: ImportEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

// ==========================================
// CancelToken - 协作式取消
// ==========================================
// 提交引擎在行块之间检查,不会在行中途打断
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
