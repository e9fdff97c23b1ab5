// ==========================================
// 导入流水线端到端测试
// ==========================================
// 覆盖: 解析 → 映射 → 校验 → 提交 → 档案/日志落库
// ==========================================

mod helpers;

use helpers::{make_apis, rent_roll_csv, test_conn, ACTOR, UNIT};
use property_import_core::domain::journal::JournalFilter;
use property_import_core::domain::types::{
    ImportCategory, ImportStage, ImportStatus, JournalAction,
};
use property_import_core::engine::events::{
    CollectingProgressSink, ImportEvent, NoOpProgressSink,
};
use property_import_core::importer::error::ImportError;
use property_import_core::importer::file_parser::FileFormat;
use property_import_core::importer::session::StartImportRequest;
use std::sync::Arc;

fn request(bytes: Vec<u8>, category: ImportCategory) -> StartImportRequest {
    StartImportRequest {
        file_bytes: bytes,
        declared_format: None,
        category,
        business_unit_id: UNIT.to_string(),
        file_name: "import.csv".to_string(),
        folder_id: None,
    }
}

#[tokio::test]
async fn test_clean_rent_roll_import_succeeds() {
    let conn = test_conn();
    let (import_api, _, journal_api) = make_apis(&conn);

    let bytes = rent_roll_csv(&[
        ("A-101", "Boulangerie Petit", "L-001", "2025-06-30", "85.5", "24000"),
        ("A-102", "Optique Claire", "L-002", "2025-06-30", "120", "31500"),
    ]);
    let mut session = import_api
        .start_session(request(bytes, ImportCategory::RentRoll), Arc::new(NoOpProgressSink), None)
        .await
        .unwrap();

    assert_eq!(session.stage(), ImportStage::Mapping);
    let validation = session.validate().unwrap();
    assert!(validation.is_valid);
    assert_eq!(validation.quality_score, 100.0);

    let outcome = session.commit(false).await.unwrap();
    assert_eq!(outcome.status, ImportStatus::Success);
    assert_eq!(outcome.rows_affected, 2);
    assert_eq!(session.stage(), ImportStage::Done);

    // 恰好一条档案 + 一条 import 日志,rows_affected 一致
    let files = import_api.list_import_files(Some(UNIT), None).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].rows_affected, 2);
    assert_eq!(files[0].status, ImportStatus::Success);

    let imports = journal_api
        .list_entries(&JournalFilter {
            actions: Some(vec![JournalAction::Import]),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].rows_affected, 2);
    assert_eq!(imports[0].actor_id, ACTOR);
}

#[tokio::test]
async fn test_bad_surface_row_partial_commit() {
    // 3 行,第 2 行面积非数值,目标期间开放
    let conn = test_conn();
    let (import_api, _, _) = make_apis(&conn);

    let bytes = rent_roll_csv(&[
        ("A-101", "Boulangerie Petit", "L-001", "2025-06-30", "85.5", "24000"),
        ("A-102", "Optique Claire", "L-002", "2025-06-30", "beaucoup", "31500"),
        ("A-103", "Café Riviera", "L-003", "2025-06-30", "210", "58000"),
    ]);
    let mut session = import_api
        .start_session(request(bytes, ImportCategory::RentRoll), Arc::new(NoOpProgressSink), None)
        .await
        .unwrap();

    let validation = session.validate().unwrap().clone();
    assert_eq!(validation.errors.len(), 1);
    assert!((validation.quality_score - 66.7).abs() < 0.1);

    // 未确认放行: 拒绝提交
    let refused = session.commit(false).await;
    assert!(matches!(refused, Err(ImportError::ValidationNotConfirmed { .. })));

    // 确认放行: 跳过错误行,部分提交
    let outcome = session.commit(true).await.unwrap();
    assert_eq!(outcome.status, ImportStatus::Partial);
    assert_eq!(outcome.rows_affected, 2);

    let files = import_api.list_import_files(Some(UNIT), None).unwrap();
    assert_eq!(files[0].status, ImportStatus::Partial);
}

#[tokio::test]
async fn test_closed_period_import_fails_with_zero_rows() {
    // 5 行写入已关闭且未放开的期间
    let conn = test_conn();
    let (import_api, period_api, _) = make_apis(&conn);
    period_api.close_period(UNIT, 2025, 6, "月度结账").unwrap();

    let rows: Vec<(String, String, String)> = (0..5)
        .map(|i| {
            (
                format!("A-10{}", i),
                format!("Tenant {}", i),
                format!("L-00{}", i),
            )
        })
        .collect();
    let rows_ref: Vec<(&str, &str, &str, &str, &str, &str)> = rows
        .iter()
        .map(|(u, t, l)| (u.as_str(), t.as_str(), l.as_str(), "2025-06-15", "100", "20000"))
        .collect();
    let bytes = rent_roll_csv(&rows_ref);

    let mut session = import_api
        .start_session(request(bytes, ImportCategory::RentRoll), Arc::new(NoOpProgressSink), None)
        .await
        .unwrap();
    session.validate().unwrap();

    let outcome = session.commit(false).await.unwrap();
    assert_eq!(outcome.status, ImportStatus::Failure);
    assert_eq!(outcome.rows_affected, 0);
    assert_eq!(outcome.locked_rows, 5);
    assert!(outcome.error_summary.as_ref().unwrap().contains("期间已锁定"));

    let files = import_api.list_import_files(Some(UNIT), None).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].status, ImportStatus::Failure);
    assert_eq!(files[0].rows_affected, 0);
}

#[tokio::test]
async fn test_unmapped_required_field_blocks_until_fixed() {
    // annual_rent 列改名,无法自动映射 → 每行一条阻断错误
    let conn = test_conn();
    let (import_api, _, _) = make_apis(&conn);

    let mut csv = String::from("unit_code,tenant_name,lease_id,as_of_date,surface_m2,loyer\n");
    csv.push_str("A-101,Boulangerie Petit,L-001,2025-06-30,85.5,24000\n");
    csv.push_str("A-102,Optique Claire,L-002,2025-06-30,120,31500\n");

    let mut session = import_api
        .start_session(
            request(csv.into_bytes(), ImportCategory::RentRoll),
            Arc::new(NoOpProgressSink),
            None,
        )
        .await
        .unwrap();

    let validation = session.validate().unwrap().clone();
    assert!(!validation.is_valid);
    assert!(validation.required_violation);
    let rent_errors: Vec<_> = validation
        .errors
        .iter()
        .filter(|e| e.column == "annual_rent")
        .collect();
    assert_eq!(rent_errors.len(), 2);

    // 必填字段违规: 强制放行也被拒绝,不产生 success 档案
    let refused = session.commit(true).await;
    assert!(matches!(refused, Err(ImportError::RequiredViolationNotOverridable)));
    assert!(import_api.list_import_files(Some(UNIT), None).unwrap().is_empty());

    // 修正映射后重新校验并提交
    session.back_to_mapping().unwrap();
    session.set_mapping("loyer", Some("annual_rent")).unwrap();
    let validation = session.validate().unwrap();
    assert!(validation.is_valid);

    let outcome = session.commit(false).await.unwrap();
    assert_eq!(outcome.status, ImportStatus::Success);
    let files = import_api.list_import_files(Some(UNIT), None).unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].status, ImportStatus::Success);
}

#[tokio::test]
async fn test_progress_events_sequence() {
    let conn = test_conn();
    let (import_api, _, _) = make_apis(&conn);
    let sink = CollectingProgressSink::new();

    let bytes = rent_roll_csv(&[(
        "A-101", "Boulangerie Petit", "L-001", "2025-06-30", "85.5", "24000",
    )]);
    let mut session = import_api
        .start_session(request(bytes, ImportCategory::RentRoll), sink.clone(), None)
        .await
        .unwrap();
    session.validate().unwrap();
    session.commit(false).await.unwrap();

    let events = sink.events();
    let stages: Vec<ImportStage> = events
        .iter()
        .filter_map(|e| match e {
            ImportEvent::StageChanged { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![ImportStage::Mapping, ImportStage::Validation, ImportStage::Importing]
    );

    // 终态事件收尾
    assert!(matches!(
        events.last(),
        Some(ImportEvent::Terminal {
            status: ImportStatus::Success,
            rows_affected: 1,
            ..
        })
    ));
    // 提交进度事件存在且百分比封顶 100
    assert!(events.iter().any(|e| matches!(
        e,
        ImportEvent::CommitProgress { progress_percent: 100, .. }
    )));
}

#[tokio::test]
async fn test_json_input_via_declared_format() {
    let conn = test_conn();
    let (import_api, _, _) = make_apis(&conn);

    let bytes = br#"[
        {"date": "2025-01-04", "visitor_count": 1830},
        {"date": "2025-01-05", "visitor_count": 2210}
    ]"#
    .to_vec();
    let mut req = request(bytes, ImportCategory::FootTraffic);
    req.declared_format = Some(FileFormat::Json);
    req.file_name = "frequentation.json".to_string();

    let mut session = import_api
        .start_session(req, Arc::new(NoOpProgressSink), None)
        .await
        .unwrap();
    session.validate().unwrap();
    let outcome = session.commit(false).await.unwrap();

    assert_eq!(outcome.status, ImportStatus::Success);
    assert_eq!(outcome.rows_affected, 2);
}

#[tokio::test]
async fn test_unsupported_and_empty_files_create_no_session() {
    let conn = test_conn();
    let (import_api, _, journal_api) = make_apis(&conn);

    let binary = import_api
        .start_session(
            request(vec![0x89, 0x50, 0x4e, 0x47, 0xff], ImportCategory::Rents),
            Arc::new(NoOpProgressSink),
            None,
        )
        .await;
    assert!(binary.is_err());

    let empty = import_api
        .start_session(
            request(b"lease_id,period,amount_invoiced\n".to_vec(), ImportCategory::Rents),
            Arc::new(NoOpProgressSink),
            None,
        )
        .await;
    assert!(empty.is_err());

    // 解析失败不产生任何落库痕迹
    assert!(import_api.list_import_files(None, None).unwrap().is_empty());
    assert!(journal_api.list_entries(&Default::default()).unwrap().is_empty());
}

#[tokio::test]
async fn test_set_mapping_stage_guard() {
    let conn = test_conn();
    let (import_api, _, _) = make_apis(&conn);

    let bytes = rent_roll_csv(&[(
        "A-101", "Boulangerie Petit", "L-001", "2025-06-30", "85.5", "24000",
    )]);
    let mut session = import_api
        .start_session(request(bytes, ImportCategory::RentRoll), Arc::new(NoOpProgressSink), None)
        .await
        .unwrap();
    session.validate().unwrap();

    // validation 阶段不允许改映射
    let result = session.set_mapping("unit_code", None);
    assert!(matches!(result, Err(ImportError::InvalidStage { .. })));
}

#[tokio::test]
async fn test_cancel_before_commit_leaves_trace() {
    let conn = test_conn();
    let (import_api, _, journal_api) = make_apis(&conn);

    let bytes = rent_roll_csv(&[(
        "A-101", "Boulangerie Petit", "L-001", "2025-06-30", "85.5", "24000",
    )]);
    let mut session = import_api
        .start_session(request(bytes, ImportCategory::RentRoll), Arc::new(NoOpProgressSink), None)
        .await
        .unwrap();

    session.cancel().unwrap();
    assert_eq!(session.stage(), ImportStage::Done);
    assert_eq!(session.terminal_error(), Some("已取消"));

    let cancels = journal_api
        .list_entries(&JournalFilter {
            actions: Some(vec![JournalAction::Cancel]),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(cancels.len(), 1);
}

#[tokio::test]
async fn test_second_import_of_same_file_degrades_to_failure() {
    // 相同自然键重复落库触发存储唯一约束
    let conn = test_conn();
    let (import_api, _, _) = make_apis(&conn);

    for _ in 0..2 {
        let bytes = rent_roll_csv(&[(
            "A-101", "Boulangerie Petit", "L-001", "2025-06-30", "85.5", "24000",
        )]);
        let mut session = import_api
            .start_session(request(bytes, ImportCategory::RentRoll), Arc::new(NoOpProgressSink), None)
            .await
            .unwrap();
        session.validate().unwrap();
        let _ = session.commit(false).await.unwrap();
    }

    let files = import_api.list_import_files(Some(UNIT), None).unwrap();
    assert_eq!(files.len(), 2);
    // 第二次全部行撞唯一键 → failure,0 行
    assert!(files.iter().any(|f| f.status == ImportStatus::Failure && f.rows_affected == 0));
    assert!(files.iter().any(|f| f.status == ImportStatus::Success && f.rows_affected == 1));
}
