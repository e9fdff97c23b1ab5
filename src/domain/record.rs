// ==========================================
// 商业地产资管系统 - 领域记录模型
// ==========================================
// 职责: 转换层输出的落库记录(类型化字段值 + 自然键)
// 约定: 字段按 BTreeMap 排序,保证同输入产出字节一致
// ==========================================

use crate::domain::types::ImportCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

// ==========================================
// FieldValue - 类型化单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDate),
    Flag(bool),
}

impl FieldValue {
    /// 规范化字符串形式(用于自然键拼接)
    pub fn canonical(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Decimal(d) => format!("{}", d),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Flag(b) => if *b { "1" } else { "0" }.to_string(),
        }
    }

    /// 转换为 JSON 值(用于落库 payload)
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Text(s) => JsonValue::String(s.clone()),
            FieldValue::Integer(i) => JsonValue::from(*i),
            FieldValue::Decimal(d) => {
                serde_json::Number::from_f64(*d).map(JsonValue::Number).unwrap_or(JsonValue::Null)
            }
            FieldValue::Date(d) => JsonValue::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Flag(b) => JsonValue::Bool(*b),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(i) => Some(*i as f64),
            FieldValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }
}

// ==========================================
// DomainRecord - 落库记录
// ==========================================
// record_id 为自然键(由类别 key 字段拼接),同键重复落库
// 将触发存储层唯一约束,由提交引擎降级为 partial
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub category: ImportCategory,
    pub record_id: String,
    pub business_unit_id: String,
    /// 期间锁归属日期(无日期字段的类别为 None,不受期间锁约束)
    pub effective_date: Option<NaiveDate>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl DomainRecord {
    /// 落库目标表名
    pub fn table(&self) -> &'static str {
        self.category.schema().table
    }

    /// 序列化字段为 JSON 对象(BTreeMap 保证键序稳定)
    pub fn payload_json(&self) -> JsonValue {
        let mut map = Map::new();
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_date() {
        let v = FieldValue::Date(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(v.canonical(), "2025-03-01");
    }

    #[test]
    fn test_payload_key_order_stable() {
        let mut fields = BTreeMap::new();
        fields.insert("b".to_string(), FieldValue::Integer(2));
        fields.insert("a".to_string(), FieldValue::Integer(1));
        let record = DomainRecord {
            category: ImportCategory::Budget,
            record_id: "K1".to_string(),
            business_unit_id: "BU01".to_string(),
            effective_date: None,
            fields,
        };
        assert_eq!(record.payload_json().to_string(), r#"{"a":1,"b":2}"#);
    }
}
