// ==========================================
// 商业地产资管系统 - 导入文件档案仓储
// ==========================================
// 红线: 档案创建后不可变,仅允许软删除
// ==========================================

use crate::domain::import_file::ImportFile;
use crate::domain::types::{ImportCategory, ImportStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct ImportFileRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ImportFileRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入档案
    pub fn insert(&self, file: &ImportFile) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO import_file (
                id, name, folder_id, business_unit_id, category, imported_at,
                status, rows_affected, quality_score, error_summary, deleted
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                file.id,
                file.name,
                file.folder_id,
                file.business_unit_id,
                file.category.as_str(),
                file.imported_at.format("%Y-%m-%d %H:%M:%S").to_string(),
                file.status.as_str(),
                file.rows_affected,
                file.quality_score,
                file.error_summary,
                file.deleted,
            ],
        )?;
        Ok(())
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<ImportFile>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!("{} WHERE id = ?", Self::SELECT_BASE))?;

        match stmt.query_row(params![id], Self::map_row) {
            Ok(file) => Ok(Some(file)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 列表查询(排除软删除,新档案在前)
    pub fn list(
        &self,
        business_unit_id: Option<&str>,
        folder_id: Option<&str>,
    ) -> RepositoryResult<Vec<ImportFile>> {
        let conn = self.get_conn()?;

        let mut sql = format!("{} WHERE deleted = 0", Self::SELECT_BASE);
        let mut params_vec: Vec<String> = Vec::new();
        if let Some(unit) = business_unit_id {
            sql.push_str(" AND business_unit_id = ?");
            params_vec.push(unit.to_string());
        }
        if let Some(folder) = folder_id {
            sql.push_str(" AND folder_id = ?");
            params_vec.push(folder.to_string());
        }
        sql.push_str(" ORDER BY imported_at DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let files = stmt
            .query_map(rusqlite::params_from_iter(params_vec), Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(files)
    }

    /// 软删除
    pub fn soft_delete(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute("UPDATE import_file SET deleted = 1 WHERE id = ?", params![id])?;

        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "import_file".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    const SELECT_BASE: &'static str = r#"
        SELECT id, name, folder_id, business_unit_id, category, imported_at,
               status, rows_affected, quality_score, error_summary, deleted
        FROM import_file
    "#;

    fn map_row(row: &Row) -> SqliteResult<ImportFile> {
        let category_str: String = row.get(4)?;
        let imported_at_str: String = row.get(5)?;
        let status_str: String = row.get(6)?;

        let category = ImportCategory::from_str(&category_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("未知导入类别: {}", category_str).into(),
            )
        })?;
        let status = ImportStatus::from_str(&status_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                6,
                rusqlite::types::Type::Text,
                format!("未知导入状态: {}", status_str).into(),
            )
        })?;
        let imported_at =
            chrono::NaiveDateTime::parse_from_str(&imported_at_str, "%Y-%m-%d %H:%M:%S").map_err(
                |e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                },
            )?;

        Ok(ImportFile {
            id: row.get(0)?,
            name: row.get(1)?,
            folder_id: row.get(2)?,
            business_unit_id: row.get(3)?,
            category,
            imported_at,
            status,
            rows_affected: row.get(7)?,
            quality_score: row.get(8)?,
            error_summary: row.get(9)?,
            deleted: row.get(10)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn make_repo() -> ImportFileRepository {
        let conn = Connection::open_in_memory().unwrap();
        db::configure_sqlite_connection(&conn).unwrap();
        db::init_schema(&conn).unwrap();
        ImportFileRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn file(name: &str, unit: &str, folder: Option<&str>) -> ImportFile {
        ImportFile::new(
            name.to_string(),
            folder.map(String::from),
            unit.to_string(),
            ImportCategory::Rents,
            ImportStatus::Success,
            5,
            100.0,
            None,
        )
    }

    #[test]
    fn test_insert_and_list_filters() {
        let repo = make_repo();
        repo.insert(&file("a.csv", "BU01", Some("F1"))).unwrap();
        repo.insert(&file("b.csv", "BU01", None)).unwrap();
        repo.insert(&file("c.csv", "BU02", Some("F1"))).unwrap();

        assert_eq!(repo.list(None, None).unwrap().len(), 3);
        assert_eq!(repo.list(Some("BU01"), None).unwrap().len(), 2);
        assert_eq!(repo.list(Some("BU01"), Some("F1")).unwrap().len(), 1);
    }

    #[test]
    fn test_soft_delete_hides_from_list() {
        let repo = make_repo();
        let f = file("a.csv", "BU01", None);
        repo.insert(&f).unwrap();

        repo.soft_delete(&f.id).unwrap();
        assert!(repo.list(None, None).unwrap().is_empty());
        // 档案本身仍可按 id 取到
        assert!(repo.find_by_id(&f.id).unwrap().unwrap().deleted);
    }

    #[test]
    fn test_soft_delete_missing_id() {
        let repo = make_repo();
        assert!(matches!(
            repo.soft_delete("nope"),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
