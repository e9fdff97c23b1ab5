// ==========================================
// 商业地产资管系统 - 记录存储能力
// ==========================================
// 职责: 按表读写领域记录的存储抽象 + SQLite 实现
// 红线: Repository 不做业务逻辑,只做数据映射
// 约定: 批量插入单事务;唯一约束冲突按行上报,
//       其他存储错误整体回滚
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};

// ==========================================
// StoredRow - 存储行
// ==========================================
#[derive(Debug, Clone)]
pub struct StoredRow {
    pub record_id: String,
    pub business_unit_id: String,
    pub effective_date: Option<NaiveDate>,
    pub payload: JsonValue,
}

// ==========================================
// RowWrite - 单行写入结果
// ==========================================
#[derive(Debug, Clone)]
pub enum RowWriteOutcome {
    Written,
    /// 存储级约束冲突(唯一键等),该行被跳过
    ConstraintViolated(String),
}

#[derive(Debug, Clone)]
pub struct RowWrite {
    pub record_id: String,
    pub outcome: RowWriteOutcome,
}

impl RowWrite {
    pub fn is_written(&self) -> bool {
        matches!(self.outcome, RowWriteOutcome::Written)
    }
}

// ==========================================
// RecordStore Trait - 存储能力接口
// ==========================================
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 批量插入(单事务)
    ///
    /// # 返回
    /// - Ok(Vec<RowWrite>): 每行的写入结果(约束冲突不中断批次)
    /// - Err: 存储不可用/事务失败,已写行全部回滚
    async fn insert_rows(&self, table: &str, rows: Vec<StoredRow>)
        -> RepositoryResult<Vec<RowWrite>>;

    /// 单条插入
    async fn insert_row(&self, table: &str, row: StoredRow) -> RepositoryResult<()>;

    /// 按主键读取
    async fn get_row(&self, table: &str, record_id: &str) -> RepositoryResult<Option<StoredRow>>;

    /// 整行覆盖更新
    async fn update_row(
        &self,
        table: &str,
        record_id: &str,
        payload: JsonValue,
    ) -> RepositoryResult<()>;

    /// 按主键删除
    async fn delete_row(&self, table: &str, record_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// SqliteRecordStore - SQLite 实现
// ==========================================
// 所有类别共用 imported_record 表,(table_name, record_id) 唯一
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn now_text() -> String {
        chrono::Utc::now()
            .naive_utc()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert_rows(
        &self,
        table: &str,
        rows: Vec<StoredRow>,
    ) -> RepositoryResult<Vec<RowWrite>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let now = Self::now_text();
        let mut results = Vec::with_capacity(rows.len());

        for row in rows {
            let insert = tx.execute(
                r#"
                INSERT INTO imported_record (
                    table_name, record_id, business_unit_id, effective_date,
                    payload_json, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    table,
                    row.record_id,
                    row.business_unit_id,
                    row.effective_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    row.payload.to_string(),
                    now,
                    now,
                ],
            );

            match insert {
                Ok(_) => results.push(RowWrite {
                    record_id: row.record_id,
                    outcome: RowWriteOutcome::Written,
                }),
                Err(e) => match RepositoryError::from(e) {
                    RepositoryError::UniqueConstraintViolation(msg) => results.push(RowWrite {
                        record_id: row.record_id,
                        outcome: RowWriteOutcome::ConstraintViolated(msg),
                    }),
                    // 非约束错误: 回滚整批
                    other => return Err(other),
                },
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(results)
    }

    async fn insert_row(&self, table: &str, row: StoredRow) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Self::now_text();
        conn.execute(
            r#"
            INSERT INTO imported_record (
                table_name, record_id, business_unit_id, effective_date,
                payload_json, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                table,
                row.record_id,
                row.business_unit_id,
                row.effective_date.map(|d| d.format("%Y-%m-%d").to_string()),
                row.payload.to_string(),
                now,
                now,
            ],
        )?;
        Ok(())
    }

    async fn get_row(&self, table: &str, record_id: &str) -> RepositoryResult<Option<StoredRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, business_unit_id, effective_date, payload_json
            FROM imported_record
            WHERE table_name = ? AND record_id = ?
            "#,
        )?;

        let row = stmt
            .query_row(params![table, record_id], |r| {
                let record_id: String = r.get(0)?;
                let business_unit_id: String = r.get(1)?;
                let effective_date: Option<String> = r.get(2)?;
                let payload_str: String = r.get(3)?;
                Ok((record_id, business_unit_id, effective_date, payload_str))
            });

        match row {
            Ok((record_id, business_unit_id, effective_date, payload_str)) => {
                let payload = serde_json::from_str(&payload_str)?;
                Ok(Some(StoredRow {
                    record_id,
                    business_unit_id,
                    effective_date: effective_date
                        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                    payload,
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_row(
        &self,
        table: &str,
        record_id: &str,
        payload: JsonValue,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE imported_record
            SET payload_json = ?, updated_at = ?
            WHERE table_name = ? AND record_id = ?
            "#,
            params![payload.to_string(), Self::now_text(), table, record_id],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: table.to_string(),
                id: record_id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_row(&self, table: &str, record_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM imported_record WHERE table_name = ? AND record_id = ?",
            params![table, record_id],
        )?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: table.to_string(),
                id: record_id.to_string(),
            });
        }
        Ok(())
    }
}
