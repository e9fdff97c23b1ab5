// ==========================================
// 商业地产资管系统 - 导入会话状态机
// ==========================================
// 阶段: upload → mapping → validation → importing → done
// 约定: 单写者模型,同一时刻一个在途会话
// 流程: 解析 → 列映射 → 校验 → 转换 → 期间锁门禁 → 提交 → 审计
// ==========================================

use crate::domain::journal::JournalEntry;
use crate::domain::table::RawTable;
use crate::domain::types::{ImportCategory, ImportStage, ImportStatus, JournalAction};
use crate::domain::validation::{RowIssue, ValidationResult};
use crate::engine::commit_engine::{CommitContext, CommitEngine, CommitOutcome};
use crate::engine::events::{CancelToken, ImportEvent, ProgressSink};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{ColumnMapping, MappingResolver};
use crate::importer::file_parser::{FileFormat, UniversalFileParser};
use crate::importer::transformer::RecordTransformer;
use crate::importer::validator::{RowValidator, ValidationContext};
use crate::repository::{JournalRepository, RecordStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// StartImportRequest - 会话入参
// ==========================================
pub struct StartImportRequest {
    pub file_bytes: Vec<u8>,
    pub declared_format: Option<FileFormat>,
    pub category: ImportCategory,
    pub business_unit_id: String,
    pub file_name: String,
    pub folder_id: Option<String>,
}

// ==========================================
// ImportSession - 导入会话
// ==========================================
pub struct ImportSession<S>
where
    S: RecordStore,
{
    session_id: String,
    actor_id: String,
    stage: ImportStage,
    category: ImportCategory,
    business_unit_id: String,
    file_name: String,
    folder_id: Option<String>,

    raw_table: RawTable,
    mappings: Vec<ColumnMapping>,
    validation: Option<ValidationResult>,
    progress_percent: u8,
    terminal_error: Option<String>,

    engine: CommitEngine<S>,
    journal_repo: JournalRepository,
    validator: RowValidator,
    validation_ctx: ValidationContext,
    progress: Arc<dyn ProgressSink>,
    cancel: CancelToken,
}

impl<S> ImportSession<S>
where
    S: RecordStore,
{
    /// 启动会话: 解析字节 + 生成初始映射,进入 mapping 阶段
    ///
    /// 解析失败(格式不支持/空文件)直接返回错误,不创建会话
    #[instrument(skip_all, fields(category = %request.category.as_str(), file = %request.file_name))]
    pub fn start(
        request: StartImportRequest,
        actor_id: String,
        engine: CommitEngine<S>,
        journal_repo: JournalRepository,
        validator: RowValidator,
        validation_ctx: ValidationContext,
        progress: Arc<dyn ProgressSink>,
    ) -> ImportResult<Self> {
        let raw_table =
            UniversalFileParser.parse_bytes(&request.file_bytes, request.declared_format)?;

        info!(
            rows = raw_table.row_count(),
            columns = raw_table.columns.len(),
            "文件解析完成"
        );

        let schema = request.category.schema();
        let mappings = MappingResolver.propose(&raw_table.columns, &schema);

        let session = Self {
            session_id: Uuid::new_v4().to_string(),
            actor_id,
            stage: ImportStage::Mapping,
            category: request.category,
            business_unit_id: request.business_unit_id,
            file_name: request.file_name,
            folder_id: request.folder_id,
            raw_table,
            mappings,
            validation: None,
            progress_percent: 25,
            terminal_error: None,
            engine,
            journal_repo,
            validator,
            validation_ctx,
            progress,
            cancel: CancelToken::new(),
        };

        session.emit_stage();
        Ok(session)
    }

    // ==========================================
    // 只读视图
    // ==========================================

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn stage(&self) -> ImportStage {
        self.stage
    }

    pub fn raw_table(&self) -> &RawTable {
        &self.raw_table
    }

    pub fn mappings(&self) -> &[ColumnMapping] {
        &self.mappings
    }

    pub fn validation(&self) -> Option<&ValidationResult> {
        self.validation.as_ref()
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn terminal_error(&self) -> Option<&str> {
        self.terminal_error.as_deref()
    }

    /// 取消句柄(可从其他持有方触发提交中止)
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // ==========================================
    // mapping 阶段
    // ==========================================

    /// 人工覆盖列映射,仅 mapping 阶段可调用
    pub fn set_mapping(
        &mut self,
        source_column: &str,
        target_field: Option<&str>,
    ) -> ImportResult<()> {
        if self.stage != ImportStage::Mapping {
            return Err(ImportError::invalid_stage(ImportStage::Mapping, self.stage));
        }
        let schema = self.category.schema();
        MappingResolver::set_mapping(&mut self.mappings, source_column, target_field, &schema)
    }

    /// 从 validation 阶段退回 mapping(修正映射后重新校验)
    pub fn back_to_mapping(&mut self) -> ImportResult<()> {
        if self.stage != ImportStage::Validation {
            return Err(ImportError::invalid_stage(ImportStage::Validation, self.stage));
        }
        self.stage = ImportStage::Mapping;
        self.validation = None;
        self.progress_percent = 25;
        self.emit_stage();
        Ok(())
    }

    // ==========================================
    // validation 阶段
    // ==========================================

    /// 重放全部行做校验,进入 validation 阶段并留痕
    pub fn validate(&mut self) -> ImportResult<&ValidationResult> {
        if self.stage != ImportStage::Mapping {
            return Err(ImportError::invalid_stage(ImportStage::Mapping, self.stage));
        }

        let schema = self.category.schema();
        let result = self.validator.validate(
            &self.raw_table,
            &self.mappings,
            &schema,
            &self.validation_ctx,
        );

        info!(
            valid_rows = result.valid_row_count,
            total_rows = result.total_row_count,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            quality_score = result.quality_score,
            "校验完成"
        );

        // validate 动作留痕(质量分 + 问题计数)
        let entry = JournalEntry::new(
            self.actor_id.clone(),
            JournalAction::Validate,
            schema.table.to_string(),
        )
        .with_rows_affected(result.total_row_count as i64)
        .with_business_unit(self.business_unit_id.clone())
        .with_source_file(self.file_name.clone())
        .with_quality_score(result.quality_score)
        .with_issues(
            result.errors.iter().map(Self::issue_text).collect(),
            result.warnings.iter().map(Self::issue_text).collect(),
        );
        self.journal_repo
            .insert(&entry)
            .map_err(crate::engine::error::EngineError::from)
            .map_err(ImportError::from)?;

        self.validation = Some(result);
        self.stage = ImportStage::Validation;
        self.progress_percent = 50;
        self.emit_stage();
        Ok(self.validation.as_ref().unwrap())
    }

    // ==========================================
    // importing 阶段
    // ==========================================

    /// 转换无阻断错误的行并提交
    ///
    /// # 放行规则
    /// - is_valid = true: 直接提交
    /// - 存在错误: 需 confirm_override = true,跳过错误行部分提交
    /// - 存在必填字段违规: 永不放行,必须退回修正映射
    pub async fn commit(&mut self, confirm_override: bool) -> ImportResult<CommitOutcome> {
        if self.stage != ImportStage::Validation {
            return Err(ImportError::invalid_stage(ImportStage::Validation, self.stage));
        }
        let validation = self
            .validation
            .clone()
            .ok_or_else(|| ImportError::InternalError("validation 阶段缺少校验结果".to_string()))?;

        if !validation.is_valid {
            if validation.required_violation {
                return Err(ImportError::RequiredViolationNotOverridable);
            }
            if !confirm_override {
                return Err(ImportError::ValidationNotConfirmed {
                    error_count: validation.errors.len(),
                });
            }
            warn!(
                errors = validation.errors.len(),
                "放行确认: 跳过错误行部分提交"
            );
        }

        let schema = self.category.schema();
        let clean_rows = validation.clean_row_indexes();
        let records = RecordTransformer.transform(
            &self.raw_table,
            &self.mappings,
            &schema,
            &clean_rows,
            &self.business_unit_id,
        );

        self.stage = ImportStage::Importing;
        self.progress_percent = 60;
        self.emit_stage();

        let ctx = CommitContext {
            actor_id: self.actor_id.clone(),
            business_unit_id: self.business_unit_id.clone(),
            category: self.category,
            file_name: self.file_name.clone(),
            folder_id: self.folder_id.clone(),
            quality_score: validation.quality_score,
            validation_errors: validation.errors.iter().map(Self::issue_text).collect(),
            validation_warnings: validation.warnings.iter().map(Self::issue_text).collect(),
            skipped_error_rows: validation.total_row_count - clean_rows.len(),
        };

        let outcome = self
            .engine
            .commit_batch(records, &ctx, self.progress.as_ref(), &self.cancel)
            .await?;

        self.stage = ImportStage::Done;
        self.progress_percent = 100;
        if outcome.status == ImportStatus::Failure {
            self.terminal_error = outcome.error_summary.clone();
        }
        self.progress.emit(ImportEvent::Terminal {
            status: outcome.status,
            rows_affected: outcome.rows_affected,
            error_summary: outcome.error_summary.clone(),
        });

        Ok(outcome)
    }

    /// 取消会话: 终止后续处理并留痕
    ///
    /// 提交中已落库的行保留(不做自动回滚,避免"行凭空消失")
    pub fn cancel(&mut self) -> ImportResult<()> {
        if self.stage == ImportStage::Done {
            return Err(ImportError::invalid_stage(ImportStage::Importing, self.stage));
        }
        self.cancel.cancel();

        let entry = JournalEntry::new(
            self.actor_id.clone(),
            JournalAction::Cancel,
            self.category.schema().table.to_string(),
        )
        .with_business_unit(self.business_unit_id.clone())
        .with_source_file(self.file_name.clone());
        self.journal_repo
            .insert(&entry)
            .map_err(crate::engine::error::EngineError::from)
            .map_err(ImportError::from)?;

        // 仅在提交尚未开始时立刻进入终态;提交中由引擎在块间停下
        if self.stage != ImportStage::Importing {
            self.stage = ImportStage::Done;
            self.terminal_error = Some("已取消".to_string());
            self.progress.emit(ImportEvent::Terminal {
                status: ImportStatus::Failure,
                rows_affected: 0,
                error_summary: self.terminal_error.clone(),
            });
        }

        info!(session_id = %self.session_id, "会话已取消");
        Ok(())
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn emit_stage(&self) {
        self.progress.emit(ImportEvent::StageChanged {
            stage: self.stage,
            progress_percent: self.progress_percent,
        });
    }

    fn issue_text(issue: &RowIssue) -> String {
        format!("行 {} [{}]: {}", issue.row_index + 1, issue.column, issue.message)
    }
}
