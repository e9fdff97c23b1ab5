// ==========================================
// 商业地产资管系统 - 记录转换器实现
// ==========================================
// 职责: 校验通过的行 → 类型化领域记录
// 约定: 纯函数,无副作用;同输入必产出同序列
// 规范化: TRIM / 代码大写 / 金额按类别精度取整 / 缺省注入
// ==========================================

use crate::domain::record::{DomainRecord, FieldValue};
use crate::domain::schema::{CategorySchema, FieldSpec};
use crate::domain::table::RawTable;
use crate::domain::types::FieldType;
use crate::importer::field_mapper::ColumnMapping;
use crate::importer::validator::coerce_cell;
use std::collections::BTreeMap;

pub struct RecordTransformer;

impl RecordTransformer {
    /// 金额按小数位四舍五入
    fn round_money(value: f64, scale: u32) -> f64 {
        let factor = 10f64.powi(scale as i32);
        (value * factor).round() / factor
    }

    /// 单字段规范化
    fn normalize_value(value: FieldValue, field: &FieldSpec, scale: u32) -> FieldValue {
        match (&field.data_type, value) {
            (FieldType::Code, FieldValue::Text(s)) => {
                FieldValue::Text(s.trim().to_uppercase())
            }
            (FieldType::Text, FieldValue::Text(s)) => FieldValue::Text(s.trim().to_string()),
            (FieldType::Money, FieldValue::Decimal(d)) => {
                FieldValue::Decimal(Self::round_money(d, scale))
            }
            (_, v) => v,
        }
    }

    /// 将指定行集转换为领域记录
    ///
    /// 调用方保证 row_indexes 为无阻断错误的行;
    /// 个别单元格仍可能为空(可选字段),按缺省值注入
    pub fn transform(
        &self,
        table: &RawTable,
        mappings: &[ColumnMapping],
        schema: &CategorySchema,
        row_indexes: &[usize],
        business_unit_id: &str,
    ) -> Vec<DomainRecord> {
        let mut records = Vec::with_capacity(row_indexes.len());

        for &row_index in row_indexes {
            let mut fields: BTreeMap<String, FieldValue> = BTreeMap::new();

            // === 已映射列 ===
            for mapping in mappings {
                let target = match mapping.target_field.as_deref() {
                    Some(t) => t,
                    None => continue,
                };
                let field = match schema.field(target) {
                    Some(f) => f,
                    None => continue,
                };
                let col_index = match table.column_index(&mapping.source_column) {
                    Some(i) => i,
                    None => continue,
                };

                let raw = table.cell(row_index, col_index);
                if raw.is_empty() {
                    continue;
                }
                if let Ok(value) = coerce_cell(raw, field.data_type) {
                    fields.insert(
                        field.name.to_string(),
                        Self::normalize_value(value, field, schema.monetary_scale),
                    );
                }
            }

            // === 缺省值注入(未赋值的可选字段) ===
            for field in schema.fields {
                if fields.contains_key(field.name) {
                    continue;
                }
                if let Some(raw) = field.default_raw {
                    if let Ok(value) = coerce_cell(raw, field.data_type) {
                        fields.insert(
                            field.name.to_string(),
                            Self::normalize_value(value, field, schema.monetary_scale),
                        );
                    } else if raw.is_empty() {
                        // 空串缺省只对文本类字段有意义
                        fields.insert(field.name.to_string(), FieldValue::Text(String::new()));
                    }
                }
            }

            // === 自然键与期间归属 ===
            let record_id = schema
                .key_fields()
                .map(|f| {
                    fields
                        .get(f.name)
                        .map(|v| v.canonical())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
                .join("-");

            let effective_date = schema
                .effective_date_field
                .and_then(|name| fields.get(name))
                .and_then(|v| v.as_date());

            records.push(DomainRecord {
                category: schema.category,
                record_id,
                business_unit_id: business_unit_id.to_string(),
                effective_date,
                fields,
            });
        }

        records
    }
}
