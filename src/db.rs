// ==========================================
// 商业地产资管系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 建表语句集中一处,避免各模块各自建表
// ==========================================

use rusqlite::Connection;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout(毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置 + 建表
pub fn open_database(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 打开内存库(测试用)
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 平台数据目录下的默认库路径
pub fn default_db_path() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("property-import-core").join("core.db")
}

/// 建表(幂等)
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- 领域记录统一落库表,(table_name, record_id) 为存储级唯一约束
        CREATE TABLE IF NOT EXISTS imported_record (
            table_name       TEXT NOT NULL,
            record_id        TEXT NOT NULL,
            business_unit_id TEXT NOT NULL,
            effective_date   TEXT,
            payload_json     TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            updated_at       TEXT NOT NULL,
            PRIMARY KEY (table_name, record_id)
        );
        CREATE INDEX IF NOT EXISTS idx_imported_record_unit
            ON imported_record (business_unit_id);

        CREATE TABLE IF NOT EXISTS import_file (
            id               TEXT PRIMARY KEY,
            name             TEXT NOT NULL,
            folder_id        TEXT,
            business_unit_id TEXT NOT NULL,
            category         TEXT NOT NULL,
            imported_at      TEXT NOT NULL,
            status           TEXT NOT NULL,
            rows_affected    INTEGER NOT NULL,
            quality_score    REAL NOT NULL,
            error_summary    TEXT,
            deleted          INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_import_file_unit
            ON import_file (business_unit_id, folder_id);

        CREATE TABLE IF NOT EXISTS closed_period (
            business_unit_id     TEXT NOT NULL,
            year                 INTEGER NOT NULL,
            month                INTEGER NOT NULL,
            closed_at            TEXT NOT NULL,
            justification        TEXT NOT NULL,
            temporarily_reopened INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (business_unit_id, year, month)
        );

        -- 审计日志: 只追加,id 单调递增
        CREATE TABLE IF NOT EXISTS journal_entry (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            ts               TEXT NOT NULL,
            actor_id         TEXT NOT NULL,
            action           TEXT NOT NULL,
            table_name       TEXT NOT NULL,
            rows_affected    INTEGER NOT NULL,
            business_unit_id TEXT,
            details_json     TEXT,
            errors_json      TEXT,
            warnings_json    TEXT,
            quality_score    REAL,
            restores_entry_id INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_journal_action ON journal_entry (action);
        CREATE INDEX IF NOT EXISTS idx_journal_unit ON journal_entry (business_unit_id);
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = open_in_memory().unwrap();
        // 重复执行不报错
        init_schema(&conn).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='journal_entry'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }
}
