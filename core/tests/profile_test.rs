//! Tests for the quality profiler, including a realistic messy-dataset
//! workflow: profile, dedup, fill, re-profile

use goldpan_core::profile::{profile, HealthWeights};
use goldpan_core::session::Session;
use goldpan_core::table::{ColumnInfo, DataType, Table, Value};
use goldpan_core::transform::{FillStrategy, TransformOp};
use goldpan_core::GoldpanError;

/// 1000 unique rows; the first 50 have a null age; 20 extra rows duplicate
/// rows 101..=120 (all with non-null ages). 1020 rows total.
fn messy_table() -> Table {
    let columns = vec![
        ColumnInfo::new("id", DataType::Integer),
        ColumnInfo::new("name", DataType::Text),
        ColumnInfo::new("age", DataType::Integer),
    ];
    let mut rows = Vec::new();
    for i in 1..=1000i64 {
        let age = if i <= 50 {
            Value::Null
        } else {
            Value::Integer(20 + (i % 50))
        };
        rows.push(vec![
            Value::Integer(i),
            Value::Text(format!("user{i}")),
            age,
        ]);
    }
    for i in 101..=120i64 {
        rows.push(vec![
            Value::Integer(i),
            Value::Text(format!("user{i}")),
            Value::Integer(20 + (i % 50)),
        ]);
    }
    Table::new(columns, rows).unwrap()
}

#[test]
fn test_messy_table_profile() {
    let table = messy_table();
    let report = profile(&table, &HealthWeights::default()).unwrap();

    assert_eq!(report.row_count, 1020);
    assert_eq!(report.column_count, 3);
    assert_eq!(report.total_cells, 3060);
    assert_eq!(report.missing_cells, 50);
    assert_eq!(report.duplicate_rows, 20);

    let expected_completeness = 1.0 - 50.0 / 3060.0;
    let expected_uniqueness = 1.0 - 20.0 / 1020.0;
    assert!((report.completeness - expected_completeness).abs() < 1e-9);
    assert!((report.uniqueness - expected_uniqueness).abs() < 1e-9);

    let expected_health =
        (100.0 * 0.5 * (expected_completeness + expected_uniqueness)).round() as u8;
    assert_eq!(report.health, expected_health);
}

#[test]
fn test_messy_table_cleanup_workflow() {
    let mut session = Session::with_defaults();
    session.register("people", messy_table()).unwrap();

    session
        .apply_transform("people", &TransformOp::Dedup)
        .unwrap();
    assert_eq!(session.dataset("people").unwrap().row_count(), 1000);

    session
        .apply_transform(
            "people",
            &TransformOp::FillMissing {
                column: "age".to_string(),
                strategy: FillStrategy::Median,
            },
        )
        .unwrap();

    let report = session.profile_dataset("people").unwrap();
    assert_eq!(report.row_count, 1000);
    assert_eq!(report.missing_cells, 0);
    assert_eq!(report.duplicate_rows, 0);
    assert!((report.completeness - 1.0).abs() < 1e-9);
    assert!((report.uniqueness - 1.0).abs() < 1e-9);
    assert_eq!(report.health, 100);

    assert_eq!(session.transaction_log().len(), 2);
}

#[test]
fn test_column_profiles() {
    let table = messy_table();
    let report = profile(&table, &HealthWeights::default()).unwrap();

    let age = report.columns.iter().find(|c| c.name == "age").unwrap();
    assert_eq!(age.data_type, DataType::Integer);
    assert_eq!(age.null_count, 50);
    assert_eq!(age.non_null_count, 970);
    // ages cycle through 50 distinct values
    assert_eq!(age.unique_values, 50);
    assert_eq!(age.sample_values.len(), 3);

    let id = report.columns.iter().find(|c| c.name == "id").unwrap();
    assert_eq!(id.null_count, 0);
    assert_eq!(id.unique_values, 1000);
}

#[test]
fn test_zero_row_table_is_perfect() {
    let table = Table::new(vec![ColumnInfo::new("x", DataType::Integer)], vec![]).unwrap();
    let report = profile(&table, &HealthWeights::default()).unwrap();
    assert_eq!(report.row_count, 0);
    assert!((report.completeness - 1.0).abs() < 1e-9);
    assert!((report.uniqueness - 1.0).abs() < 1e-9);
    assert_eq!(report.health, 100);
}

#[test]
fn test_zero_column_table_rejected() {
    let table = Table::empty(vec![]);
    let result = profile(&table, &HealthWeights::default());
    assert!(matches!(result, Err(GoldpanError::EmptyTableProfile)));
}

#[test]
fn test_all_null_table_health() {
    let table = Table::new(
        vec![ColumnInfo::new("x", DataType::Text)],
        vec![vec![Value::Null], vec![Value::Null]],
    )
    .unwrap();
    let report = profile(&table, &HealthWeights::default()).unwrap();
    assert!((report.completeness - 0.0).abs() < 1e-9);
    // the two null rows are identical, so one is a duplicate
    assert_eq!(report.duplicate_rows, 1);
    assert!(report.health < 50);
}
