// ==========================================
// 商业地产资管系统 - 校验结果模型
// ==========================================
// 用途: 校验器输出,会话在 validation 阶段暴露给调用方
// ==========================================

use crate::domain::types::Severity;
use serde::{Deserialize, Serialize};

// ==========================================
// RowIssue - 行级问题
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowIssue {
    /// 数据行下标(0 起,不含表头)
    pub row_index: usize,
    /// 问题所在列(目标字段名;映射缺失时亦指目标字段)
    pub column: String,
    pub message: String,
    pub severity: Severity,
}

// ==========================================
// ValidationResult - 校验汇总
// ==========================================
// 质量分 = 100 × 无错误行数 / 总行数;仅告警的行计入有效行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub valid_row_count: usize,
    pub total_row_count: usize,
    pub errors: Vec<RowIssue>,
    pub warnings: Vec<RowIssue>,
    pub quality_score: f64,
    /// 存在必填字段违规时提交永不可被强制放行
    pub required_violation: bool,
}

impl ValidationResult {
    /// 空表的校验结果(质量分定义为 0)
    pub fn empty() -> Self {
        Self {
            is_valid: true,
            valid_row_count: 0,
            total_row_count: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            quality_score: 0.0,
            required_violation: false,
        }
    }

    /// 汇总问题列表,计算质量分
    pub fn from_issues(
        total_row_count: usize,
        issues: Vec<RowIssue>,
        required_violation: bool,
    ) -> Self {
        use std::collections::HashSet;

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut error_rows: HashSet<usize> = HashSet::new();

        for issue in issues {
            match issue.severity {
                Severity::Error => {
                    error_rows.insert(issue.row_index);
                    errors.push(issue);
                }
                Severity::Warning => warnings.push(issue),
            }
        }

        let valid_row_count = total_row_count.saturating_sub(error_rows.len());
        let quality_score = if total_row_count == 0 {
            0.0
        } else {
            100.0 * valid_row_count as f64 / total_row_count as f64
        };

        Self {
            is_valid: errors.is_empty(),
            valid_row_count,
            total_row_count,
            errors,
            warnings,
            quality_score,
            required_violation,
        }
    }

    /// 无阻断错误的行下标列表(供转换层筛选)
    pub fn clean_row_indexes(&self) -> Vec<usize> {
        use std::collections::HashSet;
        let error_rows: HashSet<usize> = self.errors.iter().map(|e| e.row_index).collect();
        (0..self.total_row_count)
            .filter(|i| !error_rows.contains(i))
            .collect()
    }
}
