// ==========================================
// 商业地产资管系统 - 列映射解析器
// ==========================================
// 职责: 源列名 → 目标字段的初始映射 + 人工覆盖
// 红线: 只做规范化精确匹配,不做编辑距离猜测
//       (猜错一列就是把财务数据写进错误字段)
// ==========================================

use crate::domain::schema::CategorySchema;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};

// ==========================================
// ColumnMapping - 单列映射
// ==========================================
// target_field = None 表示该源列被忽略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub source_column: String,
    pub target_field: Option<String>,
}

// ==========================================
// MappingResolver - 映射解析器
// ==========================================
pub struct MappingResolver;

impl MappingResolver {
    /// 规范化列名: 小写 + 折叠变音符 + 仅保留字母数字
    pub fn normalize(name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for ch in name.to_lowercase().chars() {
            match ch {
                'à' | 'â' | 'ä' | 'á' => out.push('a'),
                'ç' => out.push('c'),
                'é' | 'è' | 'ê' | 'ë' => out.push('e'),
                'î' | 'ï' | 'í' => out.push('i'),
                'ô' | 'ö' | 'ó' => out.push('o'),
                'ù' | 'û' | 'ü' | 'ú' => out.push('u'),
                'œ' => out.push_str("oe"),
                'æ' => out.push_str("ae"),
                'ñ' => out.push('n'),
                '²' => out.push('2'),
                c if c.is_ascii_alphanumeric() => out.push(c),
                _ => {} // 标点/空白/其余符号丢弃
            }
        }
        out
    }

    /// 生成初始映射: 每个源列尝试规范化精确匹配目标字段
    ///
    /// 不变量: 一个目标字段至多被一个源列占用(先到先得),
    /// 匹配不上的源列保持未映射,由人工覆盖或忽略
    pub fn propose(&self, columns: &[String], schema: &CategorySchema) -> Vec<ColumnMapping> {
        let mut claimed: Vec<&str> = Vec::new();
        let mut mappings = Vec::with_capacity(columns.len());

        for column in columns {
            let normalized = Self::normalize(column);
            let target = schema
                .fields
                .iter()
                .find(|f| Self::normalize(f.name) == normalized && !claimed.contains(&f.name));

            if let Some(field) = target {
                claimed.push(field.name);
                mappings.push(ColumnMapping {
                    source_column: column.clone(),
                    target_field: Some(field.name.to_string()),
                });
            } else {
                mappings.push(ColumnMapping {
                    source_column: column.clone(),
                    target_field: None,
                });
            }
        }
        mappings
    }

    /// 人工覆盖某列的映射(target = None 表示忽略该列)
    ///
    /// 同一目标字段若已被其他列占用,先清除旧占用再赋予新列
    pub fn set_mapping(
        mappings: &mut [ColumnMapping],
        source_column: &str,
        target_field: Option<&str>,
        schema: &CategorySchema,
    ) -> ImportResult<()> {
        if !mappings.iter().any(|m| m.source_column == source_column) {
            return Err(ImportError::UnknownSourceColumn(source_column.to_string()));
        }

        if let Some(target) = target_field {
            if schema.field(target).is_none() {
                return Err(ImportError::UnknownTargetField(target.to_string()));
            }
            // 清除旧占用,维持"一字段一列"不变量
            for m in mappings.iter_mut() {
                if m.target_field.as_deref() == Some(target) {
                    m.target_field = None;
                }
            }
        }

        for m in mappings.iter_mut() {
            if m.source_column == source_column {
                m.target_field = target_field.map(|t| t.to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ImportCategory;

    #[test]
    fn test_normalize_strips_diacritics_and_punctuation() {
        assert_eq!(MappingResolver::normalize("Unité N° 3"), "uniten3");
        assert_eq!(MappingResolver::normalize("Surface (m²)"), "surfacem2");
        assert_eq!(MappingResolver::normalize("unit_code"), "unitcode");
        assert_eq!(MappingResolver::normalize("  Annual Rent  "), "annualrent");
    }

    #[test]
    fn test_propose_exact_normalized_match() {
        let schema = ImportCategory::RentRoll.schema();
        let columns = vec![
            "Unit Code".to_string(),
            "Tenant Name".to_string(),
            "Commentaire".to_string(),
        ];

        let mappings = MappingResolver.propose(&columns, &schema);
        assert_eq!(mappings[0].target_field.as_deref(), Some("unit_code"));
        assert_eq!(mappings[1].target_field.as_deref(), Some("tenant_name"));
        assert_eq!(mappings[2].target_field, None);
    }

    #[test]
    fn test_propose_duplicate_column_first_wins() {
        let schema = ImportCategory::Surfaces.schema();
        let columns = vec!["unit_code".to_string(), "UNIT CODE".to_string()];

        let mappings = MappingResolver.propose(&columns, &schema);
        assert_eq!(mappings[0].target_field.as_deref(), Some("unit_code"));
        assert_eq!(mappings[1].target_field, None);
    }

    #[test]
    fn test_set_mapping_override_and_clear() {
        let schema = ImportCategory::Surfaces.schema();
        let columns = vec!["code".to_string(), "surface".to_string()];
        let mut mappings = MappingResolver.propose(&columns, &schema);
        assert!(mappings.iter().all(|m| m.target_field.is_none()));

        MappingResolver::set_mapping(&mut mappings, "code", Some("unit_code"), &schema).unwrap();
        MappingResolver::set_mapping(&mut mappings, "surface", Some("surface_m2"), &schema)
            .unwrap();
        assert_eq!(mappings[0].target_field.as_deref(), Some("unit_code"));

        // 重新指派同一目标字段: 旧占用被清除
        MappingResolver::set_mapping(&mut mappings, "surface", Some("unit_code"), &schema)
            .unwrap();
        assert_eq!(mappings[0].target_field, None);
        assert_eq!(mappings[1].target_field.as_deref(), Some("unit_code"));
    }

    #[test]
    fn test_set_mapping_unknown_column() {
        let schema = ImportCategory::Surfaces.schema();
        let mut mappings = vec![ColumnMapping {
            source_column: "a".to_string(),
            target_field: None,
        }];
        let result = MappingResolver::set_mapping(&mut mappings, "missing", None, &schema);
        assert!(matches!(result, Err(ImportError::UnknownSourceColumn(_))));
    }

    #[test]
    fn test_set_mapping_unknown_field() {
        let schema = ImportCategory::Surfaces.schema();
        let mut mappings = vec![ColumnMapping {
            source_column: "a".to_string(),
            target_field: None,
        }];
        let result = MappingResolver::set_mapping(&mut mappings, "a", Some("nonexistent"), &schema);
        assert!(matches!(result, Err(ImportError::UnknownTargetField(_))));
    }
}
