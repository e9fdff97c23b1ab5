// ==========================================
// 商业地产资管系统 - 会计期间锁模型
// ==========================================
// 状态机: open → closed → temporarily-open → closed
// 唯一键: (business_unit_id, year, month)
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ClosedPeriod - 已关闭期间
// ==========================================
// 表中只存在已关闭的期间;不存在即 open
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedPeriod {
    pub business_unit_id: String,
    pub year: i32,
    pub month: u32,
    pub closed_at: NaiveDateTime,
    pub justification: String,
    /// 临时放开(允许写入,下次关闭动作前有效)
    pub temporarily_reopened: bool,
}

impl ClosedPeriod {
    /// 该期间当前是否可写
    pub fn is_writable(&self) -> bool {
        self.temporarily_reopened
    }
}

// ==========================================
// PeriodKey - 期间键
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub business_unit_id: String,
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    pub fn new(business_unit_id: impl Into<String>, year: i32, month: u32) -> Self {
        Self {
            business_unit_id: business_unit_id.into(),
            year,
            month,
        }
    }

    /// 从日期推导期间键
    pub fn from_date(business_unit_id: impl Into<String>, date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        Self::new(business_unit_id, date.year(), date.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_period_key_from_date() {
        let key = PeriodKey::from_date("BU01", NaiveDate::from_ymd_opt(2025, 7, 15).unwrap());
        assert_eq!(key.year, 2025);
        assert_eq!(key.month, 7);
    }
}
