// ==========================================
// 商业地产资管系统 - 配置管理器
// ==========================================
// 职责: config_kv 表读写 + 带缺省值的类型化读取
// 约定: 键缺失或值非法时回落缺省值,不报错
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 缺省提交行块大小
const DEFAULT_COMMIT_CHUNK_SIZE: usize = 50;
/// 缺省合理年租金区间
const DEFAULT_RENT_RANGE: (f64, f64) = (100.0, 10_000_000.0);
/// 缺省租约最大跨度(年)
const DEFAULT_MAX_LEASE_SPAN_YEARS: i32 = 30;
/// 缺省合理年份窗口
const DEFAULT_YEAR_WINDOW: (i32, i32) = (1990, 2100);

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 读取原始配置值
    pub fn get_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值(UPSERT)
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 解析数值型配置,非法值回落缺省
    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.get_value(key)
            .ok()
            .flatten()
            .and_then(|v| v.trim().parse::<T>().ok())
            .unwrap_or(default)
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_commit_chunk_size(&self) -> Result<usize, Box<dyn Error>> {
        let size = self.parse_or("commit_chunk_size", DEFAULT_COMMIT_CHUNK_SIZE);
        Ok(if size == 0 { DEFAULT_COMMIT_CHUNK_SIZE } else { size })
    }

    async fn get_rent_plausible_range(&self) -> Result<(f64, f64), Box<dyn Error>> {
        let min = self.parse_or("rent_plausible_min", DEFAULT_RENT_RANGE.0);
        let max = self.parse_or("rent_plausible_max", DEFAULT_RENT_RANGE.1);
        Ok(if min < max { (min, max) } else { DEFAULT_RENT_RANGE })
    }

    async fn get_max_lease_span_years(&self) -> Result<i32, Box<dyn Error>> {
        let years = self.parse_or("max_lease_span_years", DEFAULT_MAX_LEASE_SPAN_YEARS);
        Ok(if years > 0 { years } else { DEFAULT_MAX_LEASE_SPAN_YEARS })
    }

    async fn get_plausible_year_window(&self) -> Result<(i32, i32), Box<dyn Error>> {
        let min = self.parse_or("plausible_year_min", DEFAULT_YEAR_WINDOW.0);
        let max = self.parse_or("plausible_year_max", DEFAULT_YEAR_WINDOW.1);
        Ok(if min < max { (min, max) } else { DEFAULT_YEAR_WINDOW })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn make_manager() -> ConfigManager {
        let conn = db::open_in_memory().unwrap();
        ConfigManager::new(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_defaults_when_absent() {
        let config = make_manager();
        assert_eq!(config.get_commit_chunk_size().await.unwrap(), 50);
        assert_eq!(
            config.get_rent_plausible_range().await.unwrap(),
            (100.0, 10_000_000.0)
        );
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let config = make_manager();
        config.set_value("commit_chunk_size", "10").unwrap();
        assert_eq!(config.get_commit_chunk_size().await.unwrap(), 10);

        // UPSERT 覆盖
        config.set_value("commit_chunk_size", "20").unwrap();
        assert_eq!(config.get_commit_chunk_size().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_invalid_value_falls_back() {
        let config = make_manager();
        config.set_value("commit_chunk_size", "beaucoup").unwrap();
        assert_eq!(config.get_commit_chunk_size().await.unwrap(), 50);

        config.set_value("rent_plausible_min", "5000000").unwrap();
        config.set_value("rent_plausible_max", "100").unwrap();
        // 上下限倒挂: 整体回落缺省
        assert_eq!(
            config.get_rent_plausible_range().await.unwrap(),
            (100.0, 10_000_000.0)
        );
    }

    #[tokio::test]
    async fn test_thresholds_composition() {
        let config = make_manager();
        config.set_value("max_lease_span_years", "12").unwrap();
        let thresholds = config.validator_thresholds().await.unwrap();
        assert_eq!(thresholds.max_lease_span_years, 12);
        assert_eq!(thresholds.year_min, 1990);
    }
}
