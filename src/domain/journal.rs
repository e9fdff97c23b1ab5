// ==========================================
// 商业地产资管系统 - 审计日志领域模型
// ==========================================
// 红线: 所有写入必须记录,日志只追加不改写
// 用途: 审计追踪,变更解释,按条目回滚
// ==========================================

use crate::domain::types::JournalAction;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// JournalDetails - 变更明细
// ==========================================
// old_value 在变更发生时由提交引擎强制捕获,
// 回滚(restore)完全依赖它重建历史值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_unit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

// ==========================================
// JournalEntry - 审计日志条目
// ==========================================
// id 由仓储在落库时分配(单调递增),插入前为 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: i64,
    pub ts: NaiveDateTime,
    pub actor_id: String,
    pub action: JournalAction,
    pub table: String,
    pub rows_affected: i64,
    pub details: JournalDetails,
    pub errors: Option<Vec<String>>,
    pub warnings: Option<Vec<String>>,
    pub quality_score: Option<f64>,
    /// action = restore 时引用被回滚的原条目
    pub restores_entry_id: Option<i64>,
}

impl JournalEntry {
    /// 创建新的日志条目(id/时间戳由仓储分配)
    pub fn new(actor_id: String, action: JournalAction, table: String) -> Self {
        Self {
            id: 0,
            ts: chrono::Utc::now().naive_utc(),
            actor_id,
            action,
            table,
            rows_affected: 0,
            details: JournalDetails::default(),
            errors: None,
            warnings: None,
            quality_score: None,
            restores_entry_id: None,
        }
    }

    pub fn with_rows_affected(mut self, rows: i64) -> Self {
        self.rows_affected = rows;
        self
    }

    pub fn with_business_unit(mut self, unit: String) -> Self {
        self.details.business_unit_id = Some(unit);
        self
    }

    pub fn with_entity(mut self, entity_id: String) -> Self {
        self.details.entity_id = Some(entity_id);
        self
    }

    pub fn with_change(
        mut self,
        field: Option<String>,
        old_value: Option<JsonValue>,
        new_value: Option<JsonValue>,
    ) -> Self {
        self.details.changed_field = field;
        self.details.old_value = old_value;
        self.details.new_value = new_value;
        self
    }

    pub fn with_justification(mut self, justification: String) -> Self {
        self.details.justification = Some(justification);
        self
    }

    pub fn with_source_file(mut self, file_name: String) -> Self {
        self.details.source_file = Some(file_name);
        self
    }

    pub fn with_quality_score(mut self, score: f64) -> Self {
        self.quality_score = Some(score);
        self
    }

    pub fn with_issues(mut self, errors: Vec<String>, warnings: Vec<String>) -> Self {
        self.errors = if errors.is_empty() { None } else { Some(errors) };
        self.warnings = if warnings.is_empty() { None } else { Some(warnings) };
        self
    }

    pub fn restoring(mut self, original_entry_id: i64) -> Self {
        self.restores_entry_id = Some(original_entry_id);
        self
    }
}

// ==========================================
// JournalFilter - 查询过滤条件
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct JournalFilter {
    pub business_unit_id: Option<String>,
    pub actor_id: Option<String>,
    /// 操作类型集合(None = 不过滤)
    pub actions: Option<Vec<JournalAction>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// 对表名与明细 JSON 做包含匹配
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ==========================================
// JournalStats - 聚合统计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalStats {
    pub total_entries: i64,
    pub errors_total: i64,
    /// 带质量分条目的平均分(无样本时为 None)
    pub mean_quality_score: Option<f64>,
    pub by_action: Vec<(String, i64)>,
    pub by_table: Vec<(String, i64)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let entry = JournalEntry::new("alice".to_string(), JournalAction::Update, "lease".to_string())
            .with_rows_affected(1)
            .with_entity("L-001".to_string())
            .with_change(
                Some("annual_rent".to_string()),
                Some(serde_json::json!(1000.0)),
                Some(serde_json::json!(1200.0)),
            );

        assert_eq!(entry.rows_affected, 1);
        assert_eq!(entry.details.entity_id.as_deref(), Some("L-001"));
        assert_eq!(entry.details.changed_field.as_deref(), Some("annual_rent"));
    }

    #[test]
    fn test_empty_issue_lists_become_none() {
        let entry = JournalEntry::new("bob".to_string(), JournalAction::Import, "rents".to_string())
            .with_issues(vec![], vec![]);
        assert!(entry.errors.is_none());
        assert!(entry.warnings.is_none());
    }
}
