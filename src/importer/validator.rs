// ==========================================
// 商业地产资管系统 - 行校验器实现
// ==========================================
// 职责: 类型强转 + 业务规则校验 + 质量分计算
// 约定: 强转失败一律 Error;业务规则按自身声明的级别
// ==========================================

use crate::domain::record::FieldValue;
use crate::domain::schema::{BusinessRule, CategorySchema};
use crate::domain::table::RawTable;
use crate::domain::types::{FieldType, Severity};
use crate::domain::validation::{RowIssue, ValidationResult};
use crate::importer::field_mapper::ColumnMapping;
use chrono::{Datelike, NaiveDate};
use std::collections::HashSet;

// ==========================================
// ValidatorThresholds - 校验阈值
// ==========================================
// 来源: config_kv,构造时一次性读入
#[derive(Debug, Clone)]
pub struct ValidatorThresholds {
    /// 合理年租金区间(下限, 上限)
    pub rent_min: f64,
    pub rent_max: f64,
    /// 租约最大跨度(年)
    pub max_lease_span_years: i32,
    /// 合理日期年份窗口
    pub year_min: i32,
    pub year_max: i32,
}

impl Default for ValidatorThresholds {
    fn default() -> Self {
        Self {
            rent_min: 100.0,
            rent_max: 10_000_000.0,
            max_lease_span_years: 30,
            year_min: 1990,
            year_max: 2100,
        }
    }
}

// ==========================================
// ValidationContext - 校验上下文
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    /// 已知铺位/经营单元代码表(None 时跳过引用校验)
    pub known_unit_codes: Option<HashSet<String>>,
}

// ==========================================
// 单元格强转(转换层复用同一套函数,保证口径一致)
// ==========================================

/// 去除金额里的货币符号/千分位,统一小数点
fn normalize_numeric(raw: &str) -> String {
    let mut s: String = raw
        .chars()
        .filter(|c| !matches!(c, '€' | '$' | '£' | ' ' | '\u{a0}'))
        .collect();
    if s.contains('.') {
        // 小数点已存在,逗号视为千分位
        s.retain(|c| c != ',');
    } else {
        // 法式小数逗号
        s = s.replace(',', ".");
    }
    s
}

pub fn parse_decimal(raw: &str) -> Result<f64, String> {
    normalize_numeric(raw)
        .parse::<f64>()
        .map_err(|_| format!("无法解析为数值: {}", raw))
}

pub fn parse_integer(raw: &str) -> Result<i64, String> {
    let s = normalize_numeric(raw);
    s.parse::<i64>().map_err(|_| format!("无法解析为整数: {}", raw))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let formats = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%Y%m%d"];
    for fmt in formats {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(d);
        }
    }
    // 月度期间写法 YYYY-MM,取当月首日
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d") {
        return Ok(d);
    }
    Err(format!("无法解析为日期: {}", raw))
}

pub fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.to_uppercase().as_str() {
        "1" | "Y" | "YES" | "TRUE" | "OUI" => Ok(true),
        "0" | "N" | "NO" | "FALSE" | "NON" => Ok(false),
        _ => Err(format!("无法解析为布尔标记: {}", raw)),
    }
}

/// 按声明类型强转单元格
pub fn coerce_cell(raw: &str, data_type: FieldType) -> Result<FieldValue, String> {
    match data_type {
        FieldType::Text | FieldType::Code => Ok(FieldValue::Text(raw.to_string())),
        FieldType::Integer => parse_integer(raw).map(FieldValue::Integer),
        FieldType::Decimal | FieldType::Money | FieldType::Percent => {
            parse_decimal(raw).map(FieldValue::Decimal)
        }
        FieldType::Date => parse_date(raw).map(FieldValue::Date),
        FieldType::Flag => parse_flag(raw).map(FieldValue::Flag),
    }
}

// ==========================================
// RowValidator - 行校验器
// ==========================================
pub struct RowValidator {
    thresholds: ValidatorThresholds,
}

impl RowValidator {
    pub fn new(thresholds: ValidatorThresholds) -> Self {
        Self { thresholds }
    }

    /// 重放全部行,产出校验汇总
    ///
    /// 流程:
    /// 1. 必填字段无映射 → 每行一条 Error(指向目标字段)
    /// 2. 已映射列逐格强转,失败即 Error
    /// 3. 强转成功后跑字段业务规则,按规则级别计 Error/Warning
    pub fn validate(
        &self,
        table: &RawTable,
        mappings: &[ColumnMapping],
        schema: &CategorySchema,
        ctx: &ValidationContext,
    ) -> ValidationResult {
        let total_rows = table.row_count();
        let mut issues: Vec<RowIssue> = Vec::new();
        let mut required_violation = false;

        // === 步骤 1: 必填字段映射检查 ===
        let mapped_targets: HashSet<&str> = mappings
            .iter()
            .filter_map(|m| m.target_field.as_deref())
            .collect();

        for field in schema.required_fields() {
            if !mapped_targets.contains(field.name) {
                required_violation = true;
                for row_index in 0..total_rows {
                    issues.push(RowIssue {
                        row_index,
                        column: field.name.to_string(),
                        message: format!("必填字段未映射: {}", field.name),
                        severity: Severity::Error,
                    });
                }
            }
        }

        // === 步骤 2+3: 逐行强转与业务规则 ===
        for row_index in 0..total_rows {
            for mapping in mappings {
                let target = match mapping.target_field.as_deref() {
                    Some(t) => t,
                    None => continue, // 忽略列
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
                    if field.required {
                        required_violation = true;
                        issues.push(RowIssue {
                            row_index,
                            column: field.name.to_string(),
                            message: format!("必填字段为空: {}", field.name),
                            severity: Severity::Error,
                        });
                    }
                    continue;
                }

                let value = match coerce_cell(raw, field.data_type) {
                    Ok(v) => v,
                    Err(message) => {
                        issues.push(RowIssue {
                            row_index,
                            column: field.name.to_string(),
                            message,
                            severity: Severity::Error,
                        });
                        continue;
                    }
                };

                for rule in field.rules {
                    if let Some(message) =
                        self.check_rule(rule, &value, row_index, table, mappings, schema, ctx)
                    {
                        issues.push(RowIssue {
                            row_index,
                            column: field.name.to_string(),
                            message,
                            severity: rule.severity(),
                        });
                    }
                }
            }
        }

        ValidationResult::from_issues(total_rows, issues, required_violation)
    }

    /// 单条业务规则检查,违规时返回消息
    #[allow(clippy::too_many_arguments)]
    fn check_rule(
        &self,
        rule: &BusinessRule,
        value: &FieldValue,
        row_index: usize,
        table: &RawTable,
        mappings: &[ColumnMapping],
        schema: &CategorySchema,
        ctx: &ValidationContext,
    ) -> Option<String> {
        match rule {
            BusinessRule::NonNegative(_) => {
                let v = value.as_f64()?;
                (v < 0.0).then(|| format!("数值为负: {}", v))
            }
            BusinessRule::Range { min, max, .. } => {
                let v = value.as_f64()?;
                (v < *min || v > *max)
                    .then(|| format!("数值超出范围 [{}, {}]: {}", min, max, v))
            }
            BusinessRule::PlausibleRent(_) => {
                let v = value.as_f64()?;
                (v < self.thresholds.rent_min || v > self.thresholds.rent_max).then(|| {
                    format!(
                        "金额超出合理租金区间 [{}, {}]: {}",
                        self.thresholds.rent_min, self.thresholds.rent_max, v
                    )
                })
            }
            BusinessRule::PlausibleDateYear(_) => {
                let d = value.as_date()?;
                (d.year() < self.thresholds.year_min || d.year() > self.thresholds.year_max)
                    .then(|| {
                        format!(
                            "日期年份超出合理窗口 [{}, {}]: {}",
                            self.thresholds.year_min, self.thresholds.year_max, d
                        )
                    })
            }
            BusinessRule::SpanWithinYears { start_field, .. } => {
                let end = value.as_date()?;
                let start = self.coerced_row_value(row_index, start_field, table, mappings, schema)?
                    .as_date()?;
                if end < start {
                    return Some(format!("结束日期早于起始日期: {} < {}", end, start));
                }
                let span_years = end.year() - start.year();
                (span_years > self.thresholds.max_lease_span_years).then(|| {
                    format!(
                        "日期跨度超过 {} 年: {} → {}",
                        self.thresholds.max_lease_span_years, start, end
                    )
                })
            }
            BusinessRule::KnownUnitCode(_) => {
                let known = ctx.known_unit_codes.as_ref()?;
                let code = match value {
                    FieldValue::Text(s) => s.trim().to_uppercase(),
                    _ => return None,
                };
                (!known.contains(&code)).then(|| format!("未知经营单元代码: {}", code))
            }
        }
    }

    /// 取同一行另一字段的强转值(用于跨字段规则)
    fn coerced_row_value(
        &self,
        row_index: usize,
        field_name: &str,
        table: &RawTable,
        mappings: &[ColumnMapping],
        schema: &CategorySchema,
    ) -> Option<FieldValue> {
        let field = schema.field(field_name)?;
        let mapping = mappings
            .iter()
            .find(|m| m.target_field.as_deref() == Some(field_name))?;
        let col_index = table.column_index(&mapping.source_column)?;
        let raw = table.cell(row_index, col_index);
        if raw.is_empty() {
            return None;
        }
        coerce_cell(raw, field.data_type).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ImportCategory;
    use crate::importer::field_mapper::MappingResolver;

    fn rent_roll_table(surface_row2: &str) -> RawTable {
        RawTable::new(
            vec![
                "unit_code".to_string(),
                "tenant_name".to_string(),
                "lease_id".to_string(),
                "as_of_date".to_string(),
                "surface_m2".to_string(),
                "annual_rent".to_string(),
            ],
            vec![
                vec!["A-101", "Boulangerie Petit", "L-001", "2025-06-30", "85.5", "24000"],
                vec!["A-102", "Optique Claire", "L-002", "2025-06-30", surface_row2, "31500"],
                vec!["A-103", "Café Riviera", "L-003", "2025-06-30", "210", "58000"],
            ]
            .into_iter()
            .map(|r| r.into_iter().map(String::from).collect())
            .collect(),
        )
    }

    fn validate_rent_roll(surface_row2: &str) -> ValidationResult {
        let schema = ImportCategory::RentRoll.schema();
        let table = rent_roll_table(surface_row2);
        let mappings = MappingResolver.propose(&table.columns, &schema);
        RowValidator::new(ValidatorThresholds::default()).validate(
            &table,
            &mappings,
            &schema,
            &ValidationContext::default(),
        )
    }

    #[test]
    fn test_clean_table_is_valid() {
        let result = validate_rent_roll("120.5");
        assert!(result.is_valid, "意外错误: {:?}", result.errors);
        assert_eq!(result.quality_score, 100.0);
    }

    #[test]
    fn test_non_numeric_surface_blocks_one_row() {
        let result = validate_rent_roll("beaucoup");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row_index, 1);
        assert_eq!(result.errors[0].column, "surface_m2");
        assert_eq!(result.valid_row_count, 2);
        assert!((result.quality_score - 66.7).abs() < 0.1);
        assert!(!result.required_violation);
    }

    #[test]
    fn test_missing_required_mapping_errors_every_row() {
        let schema = ImportCategory::RentRoll.schema();
        let mut table = rent_roll_table("120.5");
        // 去掉 annual_rent 列: 必填字段无处可映射
        table.columns.retain(|c| c != "annual_rent");
        for row in &mut table.rows {
            row.truncate(5);
        }
        let mappings = MappingResolver.propose(&table.columns, &schema);
        let result = RowValidator::new(ValidatorThresholds::default()).validate(
            &table,
            &mappings,
            &schema,
            &ValidationContext::default(),
        );

        assert!(!result.is_valid);
        assert!(result.required_violation);
        let rent_errors: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.column == "annual_rent")
            .collect();
        assert_eq!(rent_errors.len(), 3); // 每行一条,指向目标字段
    }

    #[test]
    fn test_warning_rule_does_not_block() {
        // 年租 5 元: 低于合理区间下限,应为 Warning
        let schema = ImportCategory::RentRoll.schema();
        let mut table = rent_roll_table("120.5");
        table.rows[0][5] = "5".to_string();
        let mappings = MappingResolver.propose(&table.columns, &schema);
        let result = RowValidator::new(ValidatorThresholds::default()).validate(
            &table,
            &mappings,
            &schema,
            &ValidationContext::default(),
        );

        assert!(result.is_valid);
        assert_eq!(result.valid_row_count, 3);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.column == "annual_rent" && w.row_index == 0));
    }

    #[test]
    fn test_known_unit_code_checked_when_provided() {
        let schema = ImportCategory::RentRoll.schema();
        let table = rent_roll_table("120.5");
        let mappings = MappingResolver.propose(&table.columns, &schema);
        let ctx = ValidationContext {
            known_unit_codes: Some(
                ["A-101", "A-102"].iter().map(|s| s.to_string()).collect(),
            ),
        };
        let result = RowValidator::new(ValidatorThresholds::default()).validate(
            &table, &mappings, &schema, &ctx,
        );

        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.row_index == 2 && e.column == "unit_code"));
    }

    #[test]
    fn test_lease_span_rule() {
        let schema = ImportCategory::Lease.schema();
        let table = RawTable::new(
            vec![
                "lease_id".to_string(),
                "tenant_name".to_string(),
                "unit_code".to_string(),
                "start_date".to_string(),
                "end_date".to_string(),
            ],
            vec![vec![
                "L-001".to_string(),
                "Brasserie Le Nord".to_string(),
                "A-101".to_string(),
                "2020-01-01".to_string(),
                "2080-01-01".to_string(),
            ]],
        );
        let mappings = MappingResolver.propose(&table.columns, &schema);
        let result = RowValidator::new(ValidatorThresholds::default()).validate(
            &table,
            &mappings,
            &schema,
            &ValidationContext::default(),
        );

        assert!(result
            .errors
            .iter()
            .any(|e| e.column == "end_date" && e.message.contains("跨度")));
    }

    #[test]
    fn test_parse_decimal_french_formats() {
        assert_eq!(parse_decimal("120,5").unwrap(), 120.5);
        assert_eq!(parse_decimal("1 250,75").unwrap(), 1250.75);
        assert_eq!(parse_decimal("1,250.75").unwrap(), 1250.75);
        assert_eq!(parse_decimal("24000 €").unwrap(), 24000.0);
        assert!(parse_decimal("n/a").is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert_eq!(parse_date("2025-01-20").unwrap(), expected);
        assert_eq!(parse_date("20/01/2025").unwrap(), expected);
        assert_eq!(parse_date("20250120").unwrap(), expected);
        assert_eq!(
            parse_date("2025-01").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert!(parse_date("hier").is_err());
    }

    #[test]
    fn test_parse_flag_variants() {
        assert!(parse_flag("OUI").unwrap());
        assert!(parse_flag("y").unwrap());
        assert!(!parse_flag("NON").unwrap());
        assert!(parse_flag("peut-être").is_err());
    }
}
