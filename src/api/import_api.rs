// ==========================================
// 商业地产资管系统 - 导入 API
// ==========================================
// 职责: 组装导入会话 + 导入文件档案查询
// 约定: 单写者模型,调用方保证同一时刻一个在途会话
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::import_file::ImportFile;
use crate::domain::journal::JournalEntry;
use crate::domain::types::JournalAction;
use crate::engine::commit_engine::CommitEngine;
use crate::engine::events::ProgressSink;
use crate::importer::session::{ImportSession, StartImportRequest};
use crate::importer::validator::{RowValidator, ValidationContext};
use crate::repository::{ImportFileRepository, JournalRepository, SqliteRecordStore};
use rusqlite::Connection;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct ImportApi {
    conn: Arc<Mutex<Connection>>,
    actor_id: String,
}

impl ImportApi {
    pub fn new(conn: Arc<Mutex<Connection>>, actor_id: String) -> Self {
        Self { conn, actor_id }
    }

    /// 启动导入会话
    ///
    /// # 参数
    /// - request: 文件字节 + 声明格式 + 类别 + 归属信息
    /// - progress: 进度事件接收方
    /// - known_unit_codes: 已知铺位代码表(None 时跳过引用校验)
    ///
    /// # 返回
    /// - Ok(ImportSession): 已进入 mapping 阶段的会话
    /// - Err(ApiError): 解析失败(格式不支持/空文件),不创建会话
    pub async fn start_session(
        &self,
        request: StartImportRequest,
        progress: Arc<dyn ProgressSink>,
        known_unit_codes: Option<HashSet<String>>,
    ) -> ApiResult<ImportSession<SqliteRecordStore>> {
        let config = ConfigManager::new(self.conn.clone());
        let thresholds = config
            .validator_thresholds()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let chunk_size = config
            .get_commit_chunk_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let engine = CommitEngine::new(
            self.conn.clone(),
            SqliteRecordStore::new(self.conn.clone()),
            chunk_size,
        );

        let session = ImportSession::start(
            request,
            self.actor_id.clone(),
            engine,
            JournalRepository::new(self.conn.clone()),
            RowValidator::new(thresholds),
            ValidationContext { known_unit_codes },
            progress,
        )?;

        info!(session_id = %session.session_id(), "导入会话已创建");
        Ok(session)
    }

    /// 导入文件档案列表(排除软删除,新档案在前)
    pub fn list_import_files(
        &self,
        business_unit_id: Option<&str>,
        folder_id: Option<&str>,
    ) -> ApiResult<Vec<ImportFile>> {
        let repo = ImportFileRepository::new(self.conn.clone());
        Ok(repo.list(business_unit_id, folder_id)?)
    }

    /// 软删除导入文件档案并留痕
    pub fn delete_import_file(&self, file_id: &str) -> ApiResult<()> {
        let repo = ImportFileRepository::new(self.conn.clone());
        let file = repo
            .find_by_id(file_id)?
            .ok_or_else(|| ApiError::NotFound(format!("导入文件档案不存在: {}", file_id)))?;

        repo.soft_delete(file_id)?;

        let entry = JournalEntry::new(
            self.actor_id.clone(),
            JournalAction::Delete,
            "import_file".to_string(),
        )
        .with_rows_affected(1)
        .with_business_unit(file.business_unit_id.clone())
        .with_entity(file_id.to_string())
        .with_source_file(file.name.clone());
        JournalRepository::new(self.conn.clone()).insert(&entry)?;

        info!(file_id = %file_id, "导入文件档案已软删除");
        Ok(())
    }
}
