// ==========================================
// 集成测试公共辅助
// ==========================================
#![allow(dead_code)] // 各测试文件按需取用

use property_import_core::api::{ImportApi, JournalApi, PeriodApi};
use property_import_core::db;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub const ACTOR: &str = "alice";
pub const UNIT: &str = "BU01";

/// 每个测试一份内存库
pub fn test_conn() -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(db::open_in_memory().unwrap()))
}

pub fn make_apis(conn: &Arc<Mutex<Connection>>) -> (ImportApi, PeriodApi, JournalApi) {
    (
        ImportApi::new(conn.clone(), ACTOR.to_string()),
        PeriodApi::new(conn.clone(), ACTOR.to_string()),
        JournalApi::new(conn.clone(), ACTOR.to_string()),
    )
}

/// 构造租金表 CSV: (铺位, 租户, 租约, 快照日期, 面积, 年租金)
pub fn rent_roll_csv(rows: &[(&str, &str, &str, &str, &str, &str)]) -> Vec<u8> {
    let mut csv = String::from("unit_code,tenant_name,lease_id,as_of_date,surface_m2,annual_rent\n");
    for (unit, tenant, lease, date, surface, rent) in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            unit, tenant, lease, date, surface, rent
        ));
    }
    csv.into_bytes()
}
