// ==========================================
// 商业地产资管系统 - 审计日志仓储
// ==========================================
// 红线: 只追加;不提供 UPDATE / DELETE
// 红线: 日志写失败必须上抛 —— 未留痕的变更比失败的导入更糟
// ==========================================

use crate::domain::journal::{JournalEntry, JournalFilter, JournalStats};
use crate::domain::types::JournalAction;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct JournalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl JournalRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 追加日志条目,返回分配的单调 id
    pub fn insert(&self, entry: &JournalEntry) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO journal_entry (
                ts, actor_id, action, table_name, rows_affected,
                business_unit_id, details_json, errors_json, warnings_json,
                quality_score, restores_entry_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                entry.ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.actor_id,
                entry.action.as_str(),
                entry.table,
                entry.rows_affected,
                entry.details.business_unit_id,
                serde_json::to_string(&entry.details)?,
                entry.errors.as_ref().map(serde_json::to_string).transpose()?,
                entry.warnings.as_ref().map(serde_json::to_string).transpose()?,
                entry.quality_score,
                entry.restores_entry_id,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 id 查询单条
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<JournalEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?", Self::SELECT_BASE))?;

        match stmt.query_row(rusqlite::params![id], Self::map_row) {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 过滤查询,新条目在前
    pub fn list(&self, filter: &JournalFilter) -> RepositoryResult<Vec<JournalEntry>> {
        let conn = self.get_conn()?;
        let (where_clause, params) = Self::build_filter(filter);

        let limit = filter.limit.unwrap_or(100).clamp(1, 1000);
        let offset = filter.offset.unwrap_or(0).max(0);
        let sql = format!(
            "{} {} ORDER BY id DESC LIMIT {} OFFSET {}",
            Self::SELECT_BASE,
            where_clause,
            limit,
            offset
        );

        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(params), Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 聚合统计: 总数 / 错误总数 / 平均质量分 / 按操作与按表分组
    pub fn stats(&self, filter: &JournalFilter) -> RepositoryResult<JournalStats> {
        let conn = self.get_conn()?;
        let (where_clause, params) = Self::build_filter(filter);

        let total_entries: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM journal_entry {}", where_clause),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;

        let mean_quality_score: Option<f64> = conn.query_row(
            &format!(
                "SELECT AVG(quality_score) FROM journal_entry {}",
                where_clause
            ),
            params_from_iter(params.iter()),
            |row| row.get(0),
        )?;

        let mut by_action = Vec::new();
        {
            let sql = format!(
                "SELECT action, COUNT(*) FROM journal_entry {} GROUP BY action ORDER BY COUNT(*) DESC",
                where_clause
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                by_action.push(row?);
            }
        }

        let mut by_table = Vec::new();
        {
            let sql = format!(
                "SELECT table_name, COUNT(*) FROM journal_entry {} GROUP BY table_name ORDER BY COUNT(*) DESC",
                where_clause
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                by_table.push(row?);
            }
        }

        // 错误总数: 逐条解析 errors_json 数组长度求和
        let mut errors_total: i64 = 0;
        {
            let sql = format!(
                "SELECT errors_json FROM journal_entry {} ",
                where_clause
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
                row.get::<_, Option<String>>(0)
            })?;
            for row in rows {
                if let Some(json) = row? {
                    if let Ok(list) = serde_json::from_str::<Vec<String>>(&json) {
                        errors_total += list.len() as i64;
                    }
                }
            }
        }

        Ok(JournalStats {
            total_entries,
            errors_total,
            mean_quality_score,
            by_action,
            by_table,
        })
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    const SELECT_BASE: &'static str = r#"
        SELECT id, ts, actor_id, action, table_name, rows_affected,
               details_json, errors_json, warnings_json, quality_score,
               restores_entry_id
        FROM journal_entry
    "#;

    /// 过滤条件 → (WHERE 子句, 参数列表)
    fn build_filter(filter: &JournalFilter) -> (String, Vec<SqlValue>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<SqlValue> = Vec::new();

        if let Some(unit) = &filter.business_unit_id {
            conditions.push("business_unit_id = ?".to_string());
            params.push(SqlValue::Text(unit.clone()));
        }
        if let Some(actor) = &filter.actor_id {
            conditions.push("actor_id = ?".to_string());
            params.push(SqlValue::Text(actor.clone()));
        }
        if let Some(actions) = &filter.actions {
            if !actions.is_empty() {
                let placeholders = vec!["?"; actions.len()].join(", ");
                conditions.push(format!("action IN ({})", placeholders));
                for action in actions {
                    params.push(SqlValue::Text(action.as_str().to_string()));
                }
            }
        }
        if let Some(from) = filter.from {
            conditions.push("ts >= ?".to_string());
            params.push(SqlValue::Text(format!("{} 00:00:00", from.format("%Y-%m-%d"))));
        }
        if let Some(to) = filter.to {
            conditions.push("ts <= ?".to_string());
            params.push(SqlValue::Text(format!("{} 23:59:59", to.format("%Y-%m-%d"))));
        }
        if let Some(search) = &filter.search {
            conditions.push("(table_name LIKE ? OR details_json LIKE ?)".to_string());
            let pattern = format!("%{}%", search);
            params.push(SqlValue::Text(pattern.clone()));
            params.push(SqlValue::Text(pattern));
        }

        if conditions.is_empty() {
            (String::new(), params)
        } else {
            (format!("WHERE {}", conditions.join(" AND ")), params)
        }
    }

    /// 将数据库行映射为 JournalEntry 实体
    fn map_row(row: &Row) -> SqliteResult<JournalEntry> {
        let id: i64 = row.get(0)?;
        let ts_str: String = row.get(1)?;
        let actor_id: String = row.get(2)?;
        let action_str: String = row.get(3)?;
        let table: String = row.get(4)?;
        let rows_affected: i64 = row.get(5)?;
        let details_json: Option<String> = row.get(6)?;
        let errors_json: Option<String> = row.get(7)?;
        let warnings_json: Option<String> = row.get(8)?;
        let quality_score: Option<f64> = row.get(9)?;
        let restores_entry_id: Option<i64> = row.get(10)?;

        let ts = chrono::NaiveDateTime::parse_from_str(&ts_str, "%Y-%m-%d %H:%M:%S").map_err(
            |e| rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e)),
        )?;

        let action = JournalAction::from_str(&action_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("未知操作类型: {}", action_str).into(),
            )
        })?;

        Ok(JournalEntry {
            id,
            ts,
            actor_id,
            action,
            table,
            rows_affected,
            details: details_json
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default(),
            errors: errors_json.and_then(|s| serde_json::from_str(&s).ok()),
            warnings: warnings_json.and_then(|s| serde_json::from_str(&s).ok()),
            quality_score,
            restores_entry_id,
        })
    }
}
