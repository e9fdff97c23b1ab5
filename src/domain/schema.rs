// ==========================================
// 商业地产资管系统 - 导入类别字段规格
// ==========================================
// 职责: 每个导入类别的静态字段表 + 业务校验规则声明
// 红线: 字段访问走 FieldSpec,不允许散落的字符串字段名
// ==========================================

use crate::domain::types::{FieldType, ImportCategory, Severity};

// ==========================================
// BusinessRule - 业务校验规则
// ==========================================
// 每条规则自带严重级别: Warning 仅提示,Error 阻断该行
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BusinessRule {
    /// 数值不得为负
    NonNegative(Severity),
    /// 数值必须落在闭区间内
    Range { min: f64, max: f64, severity: Severity },
    /// 金额落在配置的合理租金区间外则触发
    PlausibleRent(Severity),
    /// 日期年份落在配置的合理年份窗口外则触发
    PlausibleDateYear(Severity),
    /// 与同行的起始日期字段比较,跨度不得超过配置年限
    SpanWithinYears { start_field: &'static str, severity: Severity },
    /// 值必须是已知的经营单元/铺位代码(上下文未提供代码表时跳过)
    KnownUnitCode(Severity),
}

impl BusinessRule {
    pub fn severity(&self) -> Severity {
        match self {
            BusinessRule::NonNegative(s) => *s,
            BusinessRule::Range { severity, .. } => *severity,
            BusinessRule::PlausibleRent(s) => *s,
            BusinessRule::PlausibleDateYear(s) => *s,
            BusinessRule::SpanWithinYears { severity, .. } => *severity,
            BusinessRule::KnownUnitCode(s) => *s,
        }
    }
}

// ==========================================
// FieldSpec - 字段规格
// ==========================================
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub data_type: FieldType,
    pub required: bool,
    /// 是否参与记录自然键(决定落库 record_id)
    pub key: bool,
    /// 可选字段缺省值(原始文本,落库前按类型转换)
    pub default_raw: Option<&'static str>,
    pub rules: &'static [BusinessRule],
}

impl FieldSpec {
    const fn new(name: &'static str, data_type: FieldType) -> Self {
        Self {
            name,
            data_type,
            required: false,
            key: false,
            default_raw: None,
            rules: &[],
        }
    }

    const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    const fn key(mut self) -> Self {
        self.key = true;
        self
    }

    const fn default_raw(mut self, raw: &'static str) -> Self {
        self.default_raw = Some(raw);
        self
    }

    const fn rules(mut self, rules: &'static [BusinessRule]) -> Self {
        self.rules = rules;
        self
    }
}

// ==========================================
// CategorySchema - 类别规格
// ==========================================
#[derive(Debug, Clone)]
pub struct CategorySchema {
    pub category: ImportCategory,
    /// 落库目标表名
    pub table: &'static str,
    /// 金额字段小数位数
    pub monetary_scale: u32,
    /// 决定期间锁归属的日期字段(None = 不受期间锁约束)
    pub effective_date_field: Option<&'static str>,
    pub fields: &'static [FieldSpec],
}

impl CategorySchema {
    /// 按名称查字段规格
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 必填字段列表
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// 自然键字段列表(声明顺序)
    pub fn key_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.key)
    }
}

// ==========================================
// 规则常量(供静态字段表引用)
// ==========================================

const NON_NEGATIVE_ERROR: &[BusinessRule] = &[BusinessRule::NonNegative(Severity::Error)];
const NON_NEGATIVE_WARN: &[BusinessRule] = &[BusinessRule::NonNegative(Severity::Warning)];
const PLAUSIBLE_RENT_WARN: &[BusinessRule] = &[BusinessRule::PlausibleRent(Severity::Warning)];
const KNOWN_UNIT_ERROR: &[BusinessRule] = &[BusinessRule::KnownUnitCode(Severity::Error)];
const PLAUSIBLE_YEAR_ERROR: &[BusinessRule] = &[BusinessRule::PlausibleDateYear(Severity::Error)];

// ==========================================
// 静态字段表(每类别一份)
// ==========================================

const RENT_ROLL_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("unit_code", FieldType::Code).required().key().rules(KNOWN_UNIT_ERROR),
    FieldSpec::new("tenant_name", FieldType::Text).required(),
    FieldSpec::new("lease_id", FieldType::Code).required().key(),
    FieldSpec::new("as_of_date", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("surface_m2", FieldType::Decimal).required().rules(NON_NEGATIVE_ERROR),
    FieldSpec::new("annual_rent", FieldType::Money).required().rules(PLAUSIBLE_RENT_WARN),
    FieldSpec::new("start_date", FieldType::Date),
    FieldSpec::new("end_date", FieldType::Date).rules(&[BusinessRule::SpanWithinYears {
        start_field: "start_date",
        severity: Severity::Warning,
    }]),
];

const RENTS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("lease_id", FieldType::Code).required().key(),
    FieldSpec::new("period", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("amount_invoiced", FieldType::Money).required().rules(PLAUSIBLE_RENT_WARN),
    FieldSpec::new("amount_paid", FieldType::Money).rules(NON_NEGATIVE_WARN),
];

const FOOT_TRAFFIC_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("date", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("entrance_code", FieldType::Code).key().default_raw("MAIN"),
    FieldSpec::new("visitor_count", FieldType::Integer).required().rules(NON_NEGATIVE_ERROR),
];

const REVENUE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("unit_code", FieldType::Code).required().key().rules(KNOWN_UNIT_ERROR),
    FieldSpec::new("period", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("net_revenue", FieldType::Money).required().rules(NON_NEGATIVE_WARN),
];

const CHARGES_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("charge_code", FieldType::Code).required().key(),
    FieldSpec::new("period", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("amount", FieldType::Money).required(),
    FieldSpec::new("recoverable", FieldType::Flag).default_raw("0"),
];

const LEASE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("lease_id", FieldType::Code).required().key(),
    FieldSpec::new("tenant_name", FieldType::Text).required(),
    FieldSpec::new("unit_code", FieldType::Code).required().rules(KNOWN_UNIT_ERROR),
    FieldSpec::new("start_date", FieldType::Date).required().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("end_date", FieldType::Date).required().rules(&[BusinessRule::SpanWithinYears {
        start_field: "start_date",
        severity: Severity::Error,
    }]),
    FieldSpec::new("annual_rent", FieldType::Money).rules(PLAUSIBLE_RENT_WARN),
];

const WORKS_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("work_id", FieldType::Code).required().key(),
    FieldSpec::new("description", FieldType::Text).default_raw(""),
    FieldSpec::new("budget_amount", FieldType::Money).required().rules(NON_NEGATIVE_ERROR),
    FieldSpec::new("completion_pct", FieldType::Percent).rules(&[BusinessRule::Range {
        min: 0.0,
        max: 100.0,
        severity: Severity::Warning,
    }]),
    FieldSpec::new("completed_on", FieldType::Date),
];

const BUDGET_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("budget_line", FieldType::Code).required().key(),
    FieldSpec::new("year", FieldType::Integer).required().key().rules(&[BusinessRule::Range {
        min: 2000.0,
        max: 2100.0,
        severity: Severity::Error,
    }]),
    FieldSpec::new("amount", FieldType::Money).required(),
];

const VALUATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("valuation_date", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("appraiser", FieldType::Text),
    FieldSpec::new("market_value", FieldType::Money).required().rules(NON_NEGATIVE_ERROR),
];

const SURFACES_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("unit_code", FieldType::Code).required().key().rules(KNOWN_UNIT_ERROR),
    FieldSpec::new("surface_m2", FieldType::Decimal).required().rules(NON_NEGATIVE_ERROR),
    FieldSpec::new("floor", FieldType::Text),
];

const ENERGY_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("meter_code", FieldType::Code).required().key(),
    FieldSpec::new("period", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("consumption_kwh", FieldType::Decimal).required().rules(NON_NEGATIVE_WARN),
];

const SATISFACTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("survey_date", FieldType::Date).required().key().rules(PLAUSIBLE_YEAR_ERROR),
    FieldSpec::new("respondent_count", FieldType::Integer).default_raw("0").rules(NON_NEGATIVE_WARN),
    FieldSpec::new("score", FieldType::Decimal).required().rules(&[BusinessRule::Range {
        min: 0.0,
        max: 10.0,
        severity: Severity::Error,
    }]),
];

impl ImportCategory {
    /// 取该类别的静态字段规格
    pub fn schema(&self) -> CategorySchema {
        match self {
            ImportCategory::RentRoll => CategorySchema {
                category: *self,
                table: "rent_roll",
                monetary_scale: 2,
                effective_date_field: Some("as_of_date"),
                fields: RENT_ROLL_FIELDS,
            },
            ImportCategory::Rents => CategorySchema {
                category: *self,
                table: "rents",
                monetary_scale: 2,
                effective_date_field: Some("period"),
                fields: RENTS_FIELDS,
            },
            ImportCategory::FootTraffic => CategorySchema {
                category: *self,
                table: "foot_traffic",
                monetary_scale: 2,
                effective_date_field: Some("date"),
                fields: FOOT_TRAFFIC_FIELDS,
            },
            ImportCategory::Revenue => CategorySchema {
                category: *self,
                table: "revenue",
                monetary_scale: 2,
                effective_date_field: Some("period"),
                fields: REVENUE_FIELDS,
            },
            ImportCategory::Charges => CategorySchema {
                category: *self,
                table: "charges",
                monetary_scale: 2,
                effective_date_field: Some("period"),
                fields: CHARGES_FIELDS,
            },
            ImportCategory::Lease => CategorySchema {
                category: *self,
                table: "lease",
                monetary_scale: 2,
                effective_date_field: Some("start_date"),
                fields: LEASE_FIELDS,
            },
            ImportCategory::Works => CategorySchema {
                category: *self,
                table: "works",
                monetary_scale: 2,
                effective_date_field: None,
                fields: WORKS_FIELDS,
            },
            ImportCategory::Budget => CategorySchema {
                category: *self,
                table: "budget",
                monetary_scale: 2,
                effective_date_field: None,
                fields: BUDGET_FIELDS,
            },
            ImportCategory::Valuation => CategorySchema {
                category: *self,
                table: "valuation",
                monetary_scale: 2,
                effective_date_field: Some("valuation_date"),
                fields: VALUATION_FIELDS,
            },
            ImportCategory::Surfaces => CategorySchema {
                category: *self,
                table: "surfaces",
                monetary_scale: 2,
                effective_date_field: None,
                fields: SURFACES_FIELDS,
            },
            ImportCategory::Energy => CategorySchema {
                category: *self,
                table: "energy",
                monetary_scale: 2,
                effective_date_field: Some("period"),
                fields: ENERGY_FIELDS,
            },
            ImportCategory::Satisfaction => CategorySchema {
                category: *self,
                table: "satisfaction",
                monetary_scale: 2,
                effective_date_field: Some("survey_date"),
                fields: SATISFACTION_FIELDS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_key_fields() {
        for cat in ImportCategory::all() {
            let schema = cat.schema();
            assert!(
                schema.key_fields().count() > 0,
                "类别 {} 缺少自然键字段",
                cat.as_str()
            );
        }
    }

    #[test]
    fn test_effective_date_field_exists_in_schema() {
        for cat in ImportCategory::all() {
            let schema = cat.schema();
            if let Some(name) = schema.effective_date_field {
                let field = schema.field(name).expect("期间字段必须在字段表中");
                assert_eq!(field.data_type, FieldType::Date);
            }
        }
    }

    #[test]
    fn test_rent_roll_required_fields() {
        let schema = ImportCategory::RentRoll.schema();
        let required: Vec<&str> = schema.required_fields().map(|f| f.name).collect();
        assert!(required.contains(&"unit_code"));
        assert!(required.contains(&"surface_m2"));
        assert!(required.contains(&"annual_rent"));
    }
}
