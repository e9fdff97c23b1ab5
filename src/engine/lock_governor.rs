// ==========================================
// 商业地产资管系统 - 期间锁治理器
// ==========================================
// 状态机: open → closed → temporarily-open → closed
// 红线: 可写性必须在提交时现查,不允许沿用流水线早期的判定
//       (校验与提交之间期间可能被他人关闭)
// ==========================================

use crate::domain::journal::JournalEntry;
use crate::domain::period::{ClosedPeriod, PeriodKey};
use crate::domain::types::JournalAction;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{JournalRepository, PeriodRepository};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use tracing::info;

pub struct LockGovernor {
    period_repo: PeriodRepository,
    journal_repo: JournalRepository,
}

impl LockGovernor {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            period_repo: PeriodRepository::new(conn.clone()),
            journal_repo: JournalRepository::new(conn),
        }
    }

    /// 关闭期间: open → closed(或 temporarily-open → closed)
    ///
    /// # 返回
    /// - Ok(()): 已关闭,并追加 close 日志
    /// - Err(AlreadyClosed): 期间已处于关闭状态
    pub fn close_period(
        &self,
        actor_id: &str,
        key: &PeriodKey,
        justification: &str,
    ) -> EngineResult<()> {
        match self.period_repo.find(key)? {
            Some(existing) if !existing.temporarily_reopened => {
                return Err(EngineError::AlreadyClosed {
                    business_unit_id: key.business_unit_id.clone(),
                    year: key.year,
                    month: key.month,
                });
            }
            Some(_) => {
                // 临时放开中的期间重新关闭
                self.period_repo.set_temporarily_reopened(key, false)?;
            }
            None => {
                self.period_repo.insert(&ClosedPeriod {
                    business_unit_id: key.business_unit_id.clone(),
                    year: key.year,
                    month: key.month,
                    closed_at: chrono::Utc::now().naive_utc(),
                    justification: justification.to_string(),
                    temporarily_reopened: false,
                })?;
            }
        }

        // 关闭动作必须留痕
        let entry = JournalEntry::new(
            actor_id.to_string(),
            JournalAction::Close,
            "closed_period".to_string(),
        )
        .with_rows_affected(1)
        .with_business_unit(key.business_unit_id.clone())
        .with_entity(format!("{}-{:02}", key.year, key.month))
        .with_justification(justification.to_string());
        self.journal_repo.insert(&entry)?;

        info!(
            business_unit_id = %key.business_unit_id,
            year = key.year,
            month = key.month,
            "期间已关闭"
        );
        Ok(())
    }

    /// 临时放开: closed → temporarily-open
    ///
    /// 不追加独立日志 —— 随后发生的变更日志会携带理由
    pub fn reopen_temporarily(&self, key: &PeriodKey) -> EngineResult<()> {
        match self.period_repo.find(key)? {
            None => Err(EngineError::NotClosed {
                business_unit_id: key.business_unit_id.clone(),
                year: key.year,
                month: key.month,
            }),
            Some(_) => {
                self.period_repo.set_temporarily_reopened(key, true)?;
                info!(
                    business_unit_id = %key.business_unit_id,
                    year = key.year,
                    month = key.month,
                    "期间临时放开"
                );
                Ok(())
            }
        }
    }

    /// 当前是否可写(open 或 temporarily-open)
    ///
    /// 每次现查存储,不做缓存
    pub fn is_writable(&self, key: &PeriodKey) -> EngineResult<bool> {
        Ok(match self.period_repo.find(key)? {
            None => true,
            Some(period) => period.is_writable(),
        })
    }

    /// 某经营单元的关闭期间列表
    pub fn list_closed(&self, business_unit_id: &str) -> EngineResult<Vec<ClosedPeriod>> {
        Ok(self.period_repo.list_by_unit(business_unit_id)?)
    }
}
