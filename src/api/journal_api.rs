// ==========================================
// 商业地产资管系统 - 审计日志 API
// ==========================================
// 职责: 过滤查询 / 聚合统计 / 按条目回滚
// ==========================================

use crate::api::error::ApiResult;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::journal::{JournalEntry, JournalFilter, JournalStats};
use crate::engine::commit_engine::CommitEngine;
use crate::repository::{JournalRepository, SqliteRecordStore};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct JournalApi {
    conn: Arc<Mutex<Connection>>,
    actor_id: String,
}

impl JournalApi {
    pub fn new(conn: Arc<Mutex<Connection>>, actor_id: String) -> Self {
        Self { conn, actor_id }
    }

    /// 过滤查询日志(新条目在前)
    pub fn list_entries(&self, filter: &JournalFilter) -> ApiResult<Vec<JournalEntry>> {
        let repo = JournalRepository::new(self.conn.clone());
        Ok(repo.list(filter)?)
    }

    /// 聚合统计
    pub fn get_stats(&self, filter: &JournalFilter) -> ApiResult<JournalStats> {
        let repo = JournalRepository::new(self.conn.clone());
        Ok(repo.stats(filter)?)
    }

    /// 按日志条目回滚
    ///
    /// 经提交引擎执行逆向变更(受期间锁约束),
    /// 并追加 restore 条目引用原条目
    pub async fn restore(&self, entry_id: i64) -> ApiResult<i64> {
        let config = ConfigManager::new(self.conn.clone());
        let chunk_size = config.get_commit_chunk_size().await.unwrap_or(50);
        let engine = CommitEngine::new(
            self.conn.clone(),
            SqliteRecordStore::new(self.conn.clone()),
            chunk_size,
        );

        let restore_entry_id = engine.restore(&self.actor_id, entry_id).await?;
        info!(entry_id, restore_entry_id, "日志条目已回滚");
        Ok(restore_entry_id)
    }
}
