// ==========================================
// 商业地产资管系统 - 导入文件档案模型
// ==========================================
// 用途: 提交引擎结束后写入的文件级汇总
// 红线: 创建后不可变,仅允许软删除
// ==========================================

use crate::domain::types::{ImportCategory, ImportStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// ImportFile - 导入文件档案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportFile {
    pub id: String,
    pub name: String,
    pub folder_id: Option<String>,
    pub business_unit_id: String,
    pub category: ImportCategory,
    pub imported_at: NaiveDateTime,
    pub status: ImportStatus,
    pub rows_affected: i64,
    pub quality_score: f64,
    pub error_summary: Option<String>,
    /// 软删除标记(列表查询默认过滤)
    pub deleted: bool,
}

impl ImportFile {
    pub fn new(
        name: String,
        folder_id: Option<String>,
        business_unit_id: String,
        category: ImportCategory,
        status: ImportStatus,
        rows_affected: i64,
        quality_score: f64,
        error_summary: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            folder_id,
            business_unit_id,
            category,
            imported_at: chrono::Utc::now().naive_utc(),
            status,
            rows_affected,
            quality_score,
            error_summary,
            deleted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_file_not_deleted() {
        let file = ImportFile::new(
            "loyers_2025.csv".to_string(),
            None,
            "BU01".to_string(),
            ImportCategory::Rents,
            ImportStatus::Success,
            10,
            100.0,
            None,
        );
        assert!(!file.deleted);
        assert!(!file.id.is_empty());
    }
}
