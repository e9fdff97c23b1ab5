// ==========================================
// 期间锁治理集成测试
// ==========================================

mod helpers;

use helpers::{make_apis, rent_roll_csv, test_conn, UNIT};
use property_import_core::api::ApiError;
use property_import_core::domain::types::{ImportCategory, ImportStatus};
use property_import_core::engine::events::NoOpProgressSink;
use property_import_core::importer::session::StartImportRequest;
use std::sync::Arc;

#[tokio::test]
async fn test_writable_transitions() {
    let conn = test_conn();
    let (_, period_api, _) = make_apis(&conn);

    assert!(period_api.is_writable(UNIT, 2025, 6).unwrap());

    period_api.close_period(UNIT, 2025, 6, "月度结账").unwrap();
    assert!(!period_api.is_writable(UNIT, 2025, 6).unwrap());

    period_api.reopen_temporarily(UNIT, 2025, 6).unwrap();
    assert!(period_api.is_writable(UNIT, 2025, 6).unwrap());

    // 其他期间/单元不受影响
    assert!(period_api.is_writable(UNIT, 2025, 7).unwrap());
    assert!(period_api.is_writable("BU02", 2025, 6).unwrap());
}

#[tokio::test]
async fn test_close_twice_rejected() {
    let conn = test_conn();
    let (_, period_api, _) = make_apis(&conn);

    period_api.close_period(UNIT, 2025, 6, "月度结账").unwrap();
    let result = period_api.close_period(UNIT, 2025, 6, "重复关闭");
    assert!(matches!(result, Err(ApiError::AlreadyClosed(_))));
}

#[tokio::test]
async fn test_reopen_allows_import_then_reclose() {
    let conn = test_conn();
    let (import_api, period_api, _) = make_apis(&conn);

    period_api.close_period(UNIT, 2025, 6, "月度结账").unwrap();
    period_api.reopen_temporarily(UNIT, 2025, 6).unwrap();

    // 放开期间内导入成功
    let bytes = rent_roll_csv(&[(
        "A-101", "Boulangerie Petit", "L-001", "2025-06-15", "85.5", "24000",
    )]);
    let mut session = import_api
        .start_session(
            StartImportRequest {
                file_bytes: bytes,
                declared_format: None,
                category: ImportCategory::RentRoll,
                business_unit_id: UNIT.to_string(),
                file_name: "retard.csv".to_string(),
                folder_id: None,
            },
            Arc::new(NoOpProgressSink),
            None,
        )
        .await
        .unwrap();
    session.validate().unwrap();
    let outcome = session.commit(false).await.unwrap();
    assert_eq!(outcome.status, ImportStatus::Success);

    // 修正完成后复关
    period_api.close_period(UNIT, 2025, 6, "修正后复关").unwrap();
    assert!(!period_api.is_writable(UNIT, 2025, 6).unwrap());
}

#[tokio::test]
async fn test_list_closed_periods() {
    let conn = test_conn();
    let (_, period_api, _) = make_apis(&conn);

    period_api.close_period(UNIT, 2025, 4, "四月结账").unwrap();
    period_api.close_period(UNIT, 2025, 5, "五月结账").unwrap();

    let periods = period_api.list_closed(UNIT).unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0].month, 5); // 新期间在前
    assert_eq!(periods[1].justification, "四月结账");
}
