// ==========================================
// 商业地产资管系统 - 原始表格模型
// ==========================================
// 职责: 解析层输出的统一内存表示
// 生命周期: 仅在导入会话内,不落库
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// RawTable - 解析后的原始表格
// ==========================================
// 约定: columns 为表头顺序,rows 与 columns 按下标对齐
// (尾部缺失单元格补空串,多余单元格在解析时丢弃)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// 数据行数(不含表头)
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 按列名查列下标
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 取指定行/列的单元格(越界视为空)
    pub fn cell(&self, row_index: usize, col_index: usize) -> &str {
        self.rows
            .get(row_index)
            .and_then(|r| r.get(col_index))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}
