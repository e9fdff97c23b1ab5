// ==========================================
// 商业地产资管系统 - 期间治理 API
// ==========================================
// 职责: 关闭期间 / 临时放开 / 可写性查询
// ==========================================

use crate::api::error::ApiResult;
use crate::domain::period::{ClosedPeriod, PeriodKey};
use crate::engine::lock_governor::LockGovernor;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub struct PeriodApi {
    conn: Arc<Mutex<Connection>>,
    actor_id: String,
}

impl PeriodApi {
    pub fn new(conn: Arc<Mutex<Connection>>, actor_id: String) -> Self {
        Self { conn, actor_id }
    }

    fn governor(&self) -> LockGovernor {
        LockGovernor::new(self.conn.clone())
    }

    /// 关闭会计期间(需说明理由,自动留痕)
    pub fn close_period(
        &self,
        business_unit_id: &str,
        year: i32,
        month: u32,
        justification: &str,
    ) -> ApiResult<()> {
        let key = PeriodKey::new(business_unit_id, year, month);
        self.governor()
            .close_period(&self.actor_id, &key, justification)?;
        Ok(())
    }

    /// 临时放开已关闭期间(随后的变更日志携带理由)
    pub fn reopen_temporarily(
        &self,
        business_unit_id: &str,
        year: i32,
        month: u32,
    ) -> ApiResult<()> {
        let key = PeriodKey::new(business_unit_id, year, month);
        self.governor().reopen_temporarily(&key)?;
        Ok(())
    }

    /// 当前是否可写
    pub fn is_writable(&self, business_unit_id: &str, year: i32, month: u32) -> ApiResult<bool> {
        let key = PeriodKey::new(business_unit_id, year, month);
        Ok(self.governor().is_writable(&key)?)
    }

    /// 某经营单元的关闭期间列表
    pub fn list_closed(&self, business_unit_id: &str) -> ApiResult<Vec<ClosedPeriod>> {
        Ok(self.governor().list_closed(business_unit_id)?)
    }
}
