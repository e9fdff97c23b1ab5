// ==========================================
// 商业地产资管系统 - 会计期间仓储
// ==========================================
// 表中只存已关闭期间;(unit, year, month) 唯一
// ==========================================

use crate::domain::period::{ClosedPeriod, PeriodKey};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct PeriodRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PeriodRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入关闭记录
    pub fn insert(&self, period: &ClosedPeriod) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO closed_period (
                business_unit_id, year, month, closed_at, justification,
                temporarily_reopened
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                period.business_unit_id,
                period.year,
                period.month,
                period.closed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                period.justification,
                period.temporarily_reopened,
            ],
        )?;
        Ok(())
    }

    /// 按键查询(None = 期间处于 open 状态)
    pub fn find(&self, key: &PeriodKey) -> RepositoryResult<Option<ClosedPeriod>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT business_unit_id, year, month, closed_at, justification,
                   temporarily_reopened
            FROM closed_period
            WHERE business_unit_id = ? AND year = ? AND month = ?
            "#,
        )?;

        match stmt.query_row(
            params![key.business_unit_id, key.year, key.month],
            Self::map_row,
        ) {
            Ok(period) => Ok(Some(period)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 设置临时放开标记
    pub fn set_temporarily_reopened(
        &self,
        key: &PeriodKey,
        reopened: bool,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE closed_period SET temporarily_reopened = ?
            WHERE business_unit_id = ? AND year = ? AND month = ?
            "#,
            params![reopened, key.business_unit_id, key.year, key.month],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "closed_period".to_string(),
                id: format!("{} {}-{:02}", key.business_unit_id, key.year, key.month),
            });
        }
        Ok(())
    }

    /// 某经营单元的关闭期间列表(新期间在前)
    pub fn list_by_unit(&self, business_unit_id: &str) -> RepositoryResult<Vec<ClosedPeriod>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT business_unit_id, year, month, closed_at, justification,
                   temporarily_reopened
            FROM closed_period
            WHERE business_unit_id = ?
            ORDER BY year DESC, month DESC
            "#,
        )?;

        let periods = stmt
            .query_map(params![business_unit_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(periods)
    }

    fn map_row(row: &Row) -> SqliteResult<ClosedPeriod> {
        let closed_at_str: String = row.get(3)?;
        let closed_at =
            chrono::NaiveDateTime::parse_from_str(&closed_at_str, "%Y-%m-%d %H:%M:%S").map_err(
                |e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                },
            )?;

        Ok(ClosedPeriod {
            business_unit_id: row.get(0)?,
            year: row.get(1)?,
            month: row.get(2)?,
            closed_at,
            justification: row.get(4)?,
            temporarily_reopened: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn make_repo() -> PeriodRepository {
        let conn = Connection::open_in_memory().unwrap();
        db::configure_sqlite_connection(&conn).unwrap();
        db::init_schema(&conn).unwrap();
        PeriodRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn closed(unit: &str, year: i32, month: u32) -> ClosedPeriod {
        ClosedPeriod {
            business_unit_id: unit.to_string(),
            year,
            month,
            closed_at: chrono::Utc::now().naive_utc(),
            justification: "月度结账".to_string(),
            temporarily_reopened: false,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = make_repo();
        repo.insert(&closed("BU01", 2025, 6)).unwrap();

        let found = repo.find(&PeriodKey::new("BU01", 2025, 6)).unwrap();
        assert!(found.is_some());
        assert!(repo.find(&PeriodKey::new("BU01", 2025, 7)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_close_violates_unique() {
        let repo = make_repo();
        repo.insert(&closed("BU01", 2025, 6)).unwrap();
        let result = repo.insert(&closed("BU01", 2025, 6));
        assert!(matches!(
            result,
            Err(RepositoryError::UniqueConstraintViolation(_))
        ));
    }

    #[test]
    fn test_set_temporarily_reopened() {
        let repo = make_repo();
        repo.insert(&closed("BU01", 2025, 6)).unwrap();
        let key = PeriodKey::new("BU01", 2025, 6);

        repo.set_temporarily_reopened(&key, true).unwrap();
        assert!(repo.find(&key).unwrap().unwrap().temporarily_reopened);
    }

    #[test]
    fn test_list_by_unit_ordering() {
        let repo = make_repo();
        repo.insert(&closed("BU01", 2025, 3)).unwrap();
        repo.insert(&closed("BU01", 2025, 6)).unwrap();
        repo.insert(&closed("BU02", 2025, 6)).unwrap();

        let periods = repo.list_by_unit("BU01").unwrap();
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].month, 6);
    }
}
