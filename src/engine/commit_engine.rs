// ==========================================
// 商业地产资管系统 - 提交引擎
// ==========================================
// 职责: 批量落库 + 单条变更 + 按日志条目回滚
// 红线: 每次调用恰好写入一条 ImportFile 与一条 import 日志
//       (失败也写,rows_affected = 0)
// 红线: old_value 在变更时由引擎捕获,不交给调用方
// 约定: 期间可写性在提交时逐条现查;取消只在行块之间生效
// ==========================================

use crate::domain::import_file::ImportFile;
use crate::domain::journal::JournalEntry;
use crate::domain::period::PeriodKey;
use crate::domain::record::DomainRecord;
use crate::domain::types::{ImportCategory, ImportStatus, JournalAction};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{CancelToken, ImportEvent, ProgressSink};
use crate::engine::lock_governor::LockGovernor;
use crate::importer::validator::parse_date;
use crate::repository::{
    ImportFileRepository, JournalRepository, RecordStore, StoredRow,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// 错误摘要最多罗列的明细条数
const SUMMARY_DETAIL_LIMIT: usize = 3;

// ==========================================
// CommitContext - 批量提交上下文
// ==========================================
#[derive(Debug, Clone)]
pub struct CommitContext {
    pub actor_id: String,
    pub business_unit_id: String,
    pub category: ImportCategory,
    pub file_name: String,
    pub folder_id: Option<String>,
    pub quality_score: f64,
    /// 校验阶段的阻断问题(进入日志 errors)
    pub validation_errors: Vec<String>,
    /// 校验阶段的告警(进入日志 warnings)
    pub validation_warnings: Vec<String>,
    /// 校验阶段被剔除的行数(参与结果分级)
    pub skipped_error_rows: usize,
}

// ==========================================
// CommitOutcome - 批量提交结果
// ==========================================
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub status: ImportStatus,
    pub rows_affected: i64,
    pub errors: Vec<String>,
    /// 因期间锁被拒绝的行数
    pub locked_rows: usize,
    pub cancelled: bool,
    pub error_summary: Option<String>,
    pub import_file_id: String,
    pub journal_entry_id: i64,
}

// ==========================================
// CommitEngine - 提交引擎
// ==========================================
pub struct CommitEngine<S>
where
    S: RecordStore,
{
    store: S,
    governor: LockGovernor,
    journal_repo: JournalRepository,
    file_repo: ImportFileRepository,
    /// 每个事务块的行数(块间检查取消并让出调度)
    chunk_size: usize,
}

impl<S> CommitEngine<S>
where
    S: RecordStore,
{
    pub fn new(conn: Arc<Mutex<Connection>>, store: S, chunk_size: usize) -> Self {
        Self {
            store,
            governor: LockGovernor::new(conn.clone()),
            journal_repo: JournalRepository::new(conn.clone()),
            file_repo: ImportFileRepository::new(conn),
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn governor(&self) -> &LockGovernor {
        &self.governor
    }

    // ==========================================
    // 批量提交
    // ==========================================

    /// 提交转换层产出的记录批次
    ///
    /// # 流程
    /// 1. 逐条现查期间锁,被锁行记为错误不落库
    /// 2. 按行块写入;唯一约束冲突按行降级,不中断批次
    /// 3. 结果分级 success / partial / failure
    /// 4. 无论结果如何,写一条 ImportFile + 一条 import 日志
    pub async fn commit_batch(
        &self,
        records: Vec<DomainRecord>,
        ctx: &CommitContext,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> EngineResult<CommitOutcome> {
        let table = ctx.category.schema().table;
        let total_attempted = records.len() + ctx.skipped_error_rows;
        let mut errors: Vec<String> = ctx.validation_errors.clone();

        info!(
            table = table,
            records = records.len(),
            skipped = ctx.skipped_error_rows,
            "开始批量提交"
        );

        // === 步骤 1: 期间锁过滤(本次调用内按期间键缓存现查结果) ===
        let mut writable_cache: HashMap<PeriodKey, bool> = HashMap::new();
        let mut to_write: Vec<DomainRecord> = Vec::with_capacity(records.len());
        let mut locked_rows = 0usize;

        for record in records {
            let locked = match record.effective_date {
                None => false,
                Some(date) => {
                    let key = PeriodKey::from_date(record.business_unit_id.clone(), date);
                    let writable = match writable_cache.get(&key) {
                        Some(w) => *w,
                        None => {
                            let w = self.governor.is_writable(&key)?;
                            writable_cache.insert(key.clone(), w);
                            w
                        }
                    };
                    !writable
                }
            };

            if locked {
                locked_rows += 1;
                errors.push(format!(
                    "期间已锁定,记录被拒绝: {} ({})",
                    record.record_id,
                    record
                        .effective_date
                        .map(|d| d.format("%Y-%m").to_string())
                        .unwrap_or_default()
                ));
            } else {
                to_write.push(record);
            }
        }

        // === 步骤 2: 分块写入 ===
        let total_to_write = to_write.len();
        let mut written = 0usize;
        let mut processed = 0usize;
        let mut cancelled = false;

        for chunk in to_write.chunks(self.chunk_size) {
            // 协作式取消: 只在块间检查,已落库的行保留
            if cancel.is_cancelled() {
                cancelled = true;
                warn!(written = written, "提交被取消,停止处理剩余行");
                break;
            }

            let rows: Vec<StoredRow> = chunk.iter().map(Self::to_stored_row).collect();
            match self.store.insert_rows(table, rows).await {
                Ok(results) => {
                    for result in results {
                        if result.is_written() {
                            written += 1;
                        } else if let crate::repository::RowWriteOutcome::ConstraintViolated(msg) =
                            result.outcome
                        {
                            errors.push(format!(
                                "存储约束冲突,记录被跳过: {} ({})",
                                result.record_id, msg
                            ));
                        }
                    }
                }
                Err(e) => {
                    // 存储硬错误: 当前块已回滚,终止批次
                    errors.push(format!("存储写入失败: {}", e));
                    warn!(error = %e, "存储写入失败,批次终止");
                    break;
                }
            }

            processed += chunk.len();
            let percent = if total_to_write == 0 {
                100
            } else {
                (processed * 100 / total_to_write) as u8
            };
            progress.emit(ImportEvent::CommitProgress {
                done: processed,
                total: total_to_write,
                progress_percent: percent,
            });
            debug!(done = processed, total = total_to_write, "提交进度");

            // 让出调度,保持宿主响应
            tokio::task::yield_now().await;
        }

        // === 步骤 3: 结果分级 ===
        let status = if written == total_attempted && !cancelled {
            ImportStatus::Success
        } else if written > 0 {
            ImportStatus::Partial
        } else {
            ImportStatus::Failure
        };

        let error_summary = Self::summarize(&errors, cancelled);

        // === 步骤 4: 落档案 + 日志(恰好各一条) ===
        let import_file = ImportFile::new(
            ctx.file_name.clone(),
            ctx.folder_id.clone(),
            ctx.business_unit_id.clone(),
            ctx.category,
            status,
            written as i64,
            ctx.quality_score,
            error_summary.clone(),
        );
        self.file_repo.insert(&import_file)?;

        let entry = JournalEntry::new(
            ctx.actor_id.clone(),
            JournalAction::Import,
            table.to_string(),
        )
        .with_rows_affected(written as i64)
        .with_business_unit(ctx.business_unit_id.clone())
        .with_source_file(ctx.file_name.clone())
        .with_quality_score(ctx.quality_score)
        .with_issues(errors.clone(), ctx.validation_warnings.clone());
        let journal_entry_id = self.journal_repo.insert(&entry)?;

        info!(
            status = status.as_str(),
            written = written,
            locked = locked_rows,
            cancelled = cancelled,
            "批量提交结束"
        );

        Ok(CommitOutcome {
            status,
            rows_affected: written as i64,
            errors,
            locked_rows,
            cancelled,
            error_summary,
            import_file_id: import_file.id,
            journal_entry_id,
        })
    }

    // ==========================================
    // 单条变更(old_value 由引擎捕获)
    // ==========================================

    /// 单条创建
    pub async fn apply_create(
        &self,
        actor_id: &str,
        record: &DomainRecord,
        justification: Option<String>,
    ) -> EngineResult<i64> {
        self.ensure_writable(&record.business_unit_id, record.effective_date)?;
        self.store
            .insert_row(record.table(), Self::to_stored_row(record))
            .await?;

        let mut entry = JournalEntry::new(
            actor_id.to_string(),
            JournalAction::Create,
            record.table().to_string(),
        )
        .with_rows_affected(1)
        .with_business_unit(record.business_unit_id.clone())
        .with_entity(record.record_id.clone())
        .with_change(None, None, Some(record.payload_json()));
        if let Some(j) = justification {
            entry = entry.with_justification(j);
        }
        Ok(self.journal_repo.insert(&entry)?)
    }

    /// 单字段更新
    pub async fn apply_update(
        &self,
        actor_id: &str,
        table: &str,
        record_id: &str,
        field: &str,
        new_value: JsonValue,
        justification: Option<String>,
    ) -> EngineResult<i64> {
        let current = self.fetch_row(table, record_id).await?;
        self.ensure_writable(&current.business_unit_id, current.effective_date)?;

        // 旧值在此处捕获,回滚依赖它
        let old_value = current.payload.get(field).cloned().unwrap_or(JsonValue::Null);
        let mut payload = current.payload.clone();
        if let Some(obj) = payload.as_object_mut() {
            obj.insert(field.to_string(), new_value.clone());
        }
        self.store.update_row(table, record_id, payload).await?;

        let mut entry = JournalEntry::new(
            actor_id.to_string(),
            JournalAction::Update,
            table.to_string(),
        )
        .with_rows_affected(1)
        .with_business_unit(current.business_unit_id.clone())
        .with_entity(record_id.to_string())
        .with_change(Some(field.to_string()), Some(old_value), Some(new_value));
        if let Some(j) = justification {
            entry = entry.with_justification(j);
        }
        Ok(self.journal_repo.insert(&entry)?)
    }

    /// 单条删除(整行旧值入日志)
    pub async fn apply_delete(
        &self,
        actor_id: &str,
        table: &str,
        record_id: &str,
        justification: Option<String>,
    ) -> EngineResult<i64> {
        let current = self.fetch_row(table, record_id).await?;
        self.ensure_writable(&current.business_unit_id, current.effective_date)?;

        self.store.delete_row(table, record_id).await?;

        let mut entry = JournalEntry::new(
            actor_id.to_string(),
            JournalAction::Delete,
            table.to_string(),
        )
        .with_rows_affected(1)
        .with_business_unit(current.business_unit_id.clone())
        .with_entity(record_id.to_string())
        .with_change(None, Some(current.payload.clone()), None);
        if let Some(j) = justification {
            entry = entry.with_justification(j);
        }
        Ok(self.journal_repo.insert(&entry)?)
    }

    // ==========================================
    // 按日志条目回滚
    // ==========================================

    /// 对历史条目执行逆向变更,并追加 restore 日志引用原条目
    ///
    /// 仅支持 create / update / delete;实体历史因此永远是
    /// 只前进的日志序列,不存在被改写的条目
    pub async fn restore(&self, actor_id: &str, entry_id: i64) -> EngineResult<i64> {
        let original = self
            .journal_repo
            .find_by_id(entry_id)?
            .ok_or_else(|| EngineError::NotRestorable {
                entry_id,
                reason: "条目不存在".to_string(),
            })?;

        let entity_id = original.details.entity_id.clone().ok_or_else(|| {
            EngineError::NotRestorable {
                entry_id,
                reason: "条目缺少 entity_id".to_string(),
            }
        })?;
        let table = original.table.clone();

        match original.action {
            JournalAction::Update => {
                let field = original.details.changed_field.clone().ok_or_else(|| {
                    EngineError::NotRestorable {
                        entry_id,
                        reason: "update 条目缺少 changed_field".to_string(),
                    }
                })?;
                let target_value =
                    original.details.old_value.clone().ok_or_else(|| {
                        EngineError::NotRestorable {
                            entry_id,
                            reason: "update 条目缺少 old_value".to_string(),
                        }
                    })?;

                let current = self.fetch_row(&table, &entity_id).await?;
                self.ensure_writable(&current.business_unit_id, current.effective_date)?;

                let previous = current.payload.get(&field).cloned().unwrap_or(JsonValue::Null);
                let mut payload = current.payload.clone();
                if let Some(obj) = payload.as_object_mut() {
                    obj.insert(field.clone(), target_value.clone());
                }
                self.store.update_row(&table, &entity_id, payload).await?;

                let entry = JournalEntry::new(
                    actor_id.to_string(),
                    JournalAction::Restore,
                    table.clone(),
                )
                .with_rows_affected(1)
                .with_business_unit(current.business_unit_id.clone())
                .with_entity(entity_id)
                .with_change(Some(field), Some(previous), Some(target_value))
                .restoring(entry_id);
                Ok(self.journal_repo.insert(&entry)?)
            }

            JournalAction::Delete => {
                // 逆操作: 按旧值重建整行
                let payload = original.details.old_value.clone().ok_or_else(|| {
                    EngineError::NotRestorable {
                        entry_id,
                        reason: "delete 条目缺少 old_value".to_string(),
                    }
                })?;
                let business_unit_id = original
                    .details
                    .business_unit_id
                    .clone()
                    .unwrap_or_default();
                let effective_date = Self::effective_date_of(&table, &payload);
                self.ensure_writable(&business_unit_id, effective_date)?;

                self.store
                    .insert_row(
                        &table,
                        StoredRow {
                            record_id: entity_id.clone(),
                            business_unit_id: business_unit_id.clone(),
                            effective_date,
                            payload: payload.clone(),
                        },
                    )
                    .await?;

                let entry = JournalEntry::new(
                    actor_id.to_string(),
                    JournalAction::Restore,
                    table.clone(),
                )
                .with_rows_affected(1)
                .with_business_unit(business_unit_id)
                .with_entity(entity_id)
                .with_change(None, None, Some(payload))
                .restoring(entry_id);
                Ok(self.journal_repo.insert(&entry)?)
            }

            JournalAction::Create => {
                // 逆操作: 删除被创建的实体
                let current = self.fetch_row(&table, &entity_id).await?;
                self.ensure_writable(&current.business_unit_id, current.effective_date)?;
                self.store.delete_row(&table, &entity_id).await?;

                let entry = JournalEntry::new(
                    actor_id.to_string(),
                    JournalAction::Restore,
                    table.clone(),
                )
                .with_rows_affected(1)
                .with_business_unit(current.business_unit_id.clone())
                .with_entity(entity_id)
                .with_change(None, Some(current.payload.clone()), None)
                .restoring(entry_id);
                Ok(self.journal_repo.insert(&entry)?)
            }

            _ => Err(EngineError::NotRestorable {
                entry_id,
                reason: format!("操作类型 {} 不支持回滚", original.action.as_str()),
            }),
        }
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn to_stored_row(record: &DomainRecord) -> StoredRow {
        StoredRow {
            record_id: record.record_id.clone(),
            business_unit_id: record.business_unit_id.clone(),
            effective_date: record.effective_date,
            payload: record.payload_json(),
        }
    }

    async fn fetch_row(&self, table: &str, record_id: &str) -> EngineResult<StoredRow> {
        self.store
            .get_row(table, record_id)
            .await?
            .ok_or_else(|| EngineError::RecordNotFound {
                table: table.to_string(),
                record_id: record_id.to_string(),
            })
    }

    /// 单条变更的期间锁门禁
    fn ensure_writable(&self, business_unit_id: &str, date: Option<NaiveDate>) -> EngineResult<()> {
        if let Some(date) = date {
            let key = PeriodKey::from_date(business_unit_id.to_string(), date);
            if !self.governor.is_writable(&key)? {
                return Err(EngineError::PeriodLocked {
                    business_unit_id: key.business_unit_id,
                    year: key.year,
                    month: key.month,
                });
            }
        }
        Ok(())
    }

    /// 从 payload 反推期间归属日期(表名即类别名)
    fn effective_date_of(table: &str, payload: &JsonValue) -> Option<NaiveDate> {
        let category = ImportCategory::from_str(table)?;
        let field = category.schema().effective_date_field?;
        let raw = payload.get(field)?.as_str()?;
        parse_date(raw).ok()
    }

    fn summarize(errors: &[String], cancelled: bool) -> Option<String> {
        if errors.is_empty() && !cancelled {
            return None;
        }
        let mut parts: Vec<String> = Vec::new();
        if cancelled {
            parts.push("已取消".to_string());
        }
        for e in errors.iter().take(SUMMARY_DETAIL_LIMIT) {
            parts.push(e.clone());
        }
        if errors.len() > SUMMARY_DETAIL_LIMIT {
            parts.push(format!("等共 {} 项问题", errors.len()));
        }
        Some(parts.join("; "))
    }
}
