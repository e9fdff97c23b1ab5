// ==========================================
// 商业地产资管系统 - 核心枚举类型
// ==========================================
// 职责: 导入类别/阶段/状态/严重级别等封闭枚举
// 红线: 禁止字符串散落业务代码,统一经 as_str/from_str 转换
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ImportCategory - 导入类别
// ==========================================
// 每个类别对应一张落库表和一份静态字段规格
// 新增类别 = 新增枚举变体 + 注册 schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportCategory {
    RentRoll,     // 租金表
    Rents,        // 租金流水
    FootTraffic,  // 客流
    Revenue,      // 营收
    Charges,      // 费用
    Lease,        // 租约
    Works,        // 工程
    Budget,       // 预算
    Valuation,    // 估值
    Surfaces,     // 面积
    Energy,       // 能耗
    Satisfaction, // 满意度
}

impl ImportCategory {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportCategory::RentRoll => "rent_roll",
            ImportCategory::Rents => "rents",
            ImportCategory::FootTraffic => "foot_traffic",
            ImportCategory::Revenue => "revenue",
            ImportCategory::Charges => "charges",
            ImportCategory::Lease => "lease",
            ImportCategory::Works => "works",
            ImportCategory::Budget => "budget",
            ImportCategory::Valuation => "valuation",
            ImportCategory::Surfaces => "surfaces",
            ImportCategory::Energy => "energy",
            ImportCategory::Satisfaction => "satisfaction",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "rent_roll" => Some(ImportCategory::RentRoll),
            "rents" => Some(ImportCategory::Rents),
            "foot_traffic" => Some(ImportCategory::FootTraffic),
            "revenue" => Some(ImportCategory::Revenue),
            "charges" => Some(ImportCategory::Charges),
            "lease" => Some(ImportCategory::Lease),
            "works" => Some(ImportCategory::Works),
            "budget" => Some(ImportCategory::Budget),
            "valuation" => Some(ImportCategory::Valuation),
            "surfaces" => Some(ImportCategory::Surfaces),
            "energy" => Some(ImportCategory::Energy),
            "satisfaction" => Some(ImportCategory::Satisfaction),
            _ => None,
        }
    }

    /// 全部类别列表
    pub fn all() -> &'static [ImportCategory] {
        &[
            ImportCategory::RentRoll,
            ImportCategory::Rents,
            ImportCategory::FootTraffic,
            ImportCategory::Revenue,
            ImportCategory::Charges,
            ImportCategory::Lease,
            ImportCategory::Works,
            ImportCategory::Budget,
            ImportCategory::Valuation,
            ImportCategory::Surfaces,
            ImportCategory::Energy,
            ImportCategory::Satisfaction,
        ]
    }
}

// ==========================================
// ImportStage - 导入会话阶段
// ==========================================
// 状态机: Upload → Mapping → Validation → Importing → Done
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStage {
    Upload,     // 文件已接收,解析中
    Mapping,    // 等待列映射确认
    Validation, // 校验结果已生成,等待提交
    Importing,  // 提交进行中
    Done,       // 终态(成功/部分/失败均进入此阶段)
}

impl ImportStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStage::Upload => "upload",
            ImportStage::Mapping => "mapping",
            ImportStage::Validation => "validation",
            ImportStage::Importing => "importing",
            ImportStage::Done => "done",
        }
    }
}

// ==========================================
// ImportStatus - 导入结果状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStatus {
    Success, // 全部行落库
    Partial, // 部分行落库
    Failure, // 无行落库
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Success => "success",
            ImportStatus::Partial => "partial",
            ImportStatus::Failure => "failure",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(ImportStatus::Success),
            "partial" => Some(ImportStatus::Partial),
            "failure" => Some(ImportStatus::Failure),
            _ => None,
        }
    }
}

// ==========================================
// Severity - 行级问题严重级别
// ==========================================
// Error 阻断提交,Warning 仅提示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

// ==========================================
// FieldType - 字段声明类型
// ==========================================
// 校验器按此类型做单元格强制转换
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Text,    // 自由文本
    Code,    // 短代码(落库前统一大写)
    Integer, // 整数
    Decimal, // 小数
    Money,   // 金额(按类别精度四舍五入)
    Percent, // 百分比(0-100)
    Date,    // 日期
    Flag,    // 布尔标记
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Code => "code",
            FieldType::Integer => "integer",
            FieldType::Decimal => "decimal",
            FieldType::Money => "money",
            FieldType::Percent => "percent",
            FieldType::Date => "date",
            FieldType::Flag => "flag",
        }
    }
}

// ==========================================
// JournalAction - 审计操作类型
// ==========================================
// 红线: 所有写入必须记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JournalAction {
    Import,   // 批量导入
    Create,   // 单条创建
    Update,   // 单条更新
    Delete,   // 单条删除
    Close,    // 关闭会计期间
    Validate, // 校验完成
    Cancel,   // 取消会话/提交
    Restore,  // 按历史条目回滚
}

impl JournalAction {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalAction::Import => "import",
            JournalAction::Create => "create",
            JournalAction::Update => "update",
            JournalAction::Delete => "delete",
            JournalAction::Close => "close",
            JournalAction::Validate => "validate",
            JournalAction::Cancel => "cancel",
            JournalAction::Restore => "restore",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "import" => Some(JournalAction::Import),
            "create" => Some(JournalAction::Create),
            "update" => Some(JournalAction::Update),
            "delete" => Some(JournalAction::Delete),
            "close" => Some(JournalAction::Close),
            "validate" => Some(JournalAction::Validate),
            "cancel" => Some(JournalAction::Cancel),
            "restore" => Some(JournalAction::Restore),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip() {
        for cat in ImportCategory::all() {
            assert_eq!(ImportCategory::from_str(cat.as_str()), Some(*cat));
        }
    }

    #[test]
    fn test_action_roundtrip() {
        let actions = [
            JournalAction::Import,
            JournalAction::Create,
            JournalAction::Update,
            JournalAction::Delete,
            JournalAction::Close,
            JournalAction::Validate,
            JournalAction::Cancel,
            JournalAction::Restore,
        ];
        for a in actions {
            assert_eq!(JournalAction::from_str(a.as_str()), Some(a));
        }
    }

    #[test]
    fn test_status_unknown_string() {
        assert_eq!(ImportStatus::from_str("cancelled"), None);
    }
}
