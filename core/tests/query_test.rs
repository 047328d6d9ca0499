//! Tests for the SQL adapter: ordering contracts, error classification, and
//! the session-level `df` alias

use goldpan_core::query;
use goldpan_core::session::Session;
use goldpan_core::table::{ColumnInfo, DataType, Table, Value};
use goldpan_core::GoldpanError;
use indexmap::IndexMap;

fn numbers(count: i64) -> Table {
    let rows = (1..=count)
        .map(|i| vec![Value::Integer(i), Value::Text(format!("row{i}"))])
        .collect();
    Table::new(
        vec![
            ColumnInfo::new("id", DataType::Integer),
            ColumnInfo::new("label", DataType::Text),
        ],
        rows,
    )
    .unwrap()
}

fn registry(table: &Table) -> IndexMap<String, &Table> {
    let mut tables = IndexMap::new();
    tables.insert("data".to_string(), table);
    tables
}

#[test]
fn test_limit_returns_leading_rows_in_order() {
    let table = numbers(10);
    let result = query::execute("SELECT * FROM data LIMIT 5", &registry(&table)).unwrap();
    assert_eq!(result.row_count(), 5);
    for (i, row) in result.rows.iter().enumerate() {
        assert_eq!(row[0], Value::Integer(i as i64 + 1));
    }
}

#[test]
fn test_aggregate_query() {
    let table = numbers(10);
    let result = query::execute(
        "SELECT COUNT(*) AS n, SUM(id) AS total FROM data",
        &registry(&table),
    )
    .unwrap();
    assert_eq!(result.rows[0][0], Value::Integer(10));
    assert_eq!(result.rows[0][1], Value::Integer(55));
}

#[test]
fn test_syntax_error_classified() {
    let table = numbers(3);
    let result = query::execute("SELEC * FROM data", &registry(&table));
    assert!(matches!(result, Err(GoldpanError::QuerySyntax { .. })));
}

#[test]
fn test_unknown_column_is_execution_error() {
    let table = numbers(3);
    let result = query::execute("SELECT missing FROM data", &registry(&table));
    assert!(matches!(result, Err(GoldpanError::QueryExecution { .. })));
}

#[test]
fn test_unknown_table_is_execution_error() {
    let table = numbers(3);
    let result = query::execute("SELECT * FROM nowhere", &registry(&table));
    assert!(matches!(result, Err(GoldpanError::QueryExecution { .. })));
}

#[test]
fn test_zero_row_result_keeps_schema() {
    let table = numbers(3);
    let result = query::execute("SELECT * FROM data WHERE id > 100", &registry(&table)).unwrap();
    assert_eq!(result.row_count(), 0);
    assert_eq!(result.column_names(), vec!["id", "label"]);
}

#[test]
fn test_join_across_registered_tables() {
    let left = numbers(3);
    let right = Table::new(
        vec![
            ColumnInfo::new("id", DataType::Integer),
            ColumnInfo::new("score", DataType::Float),
        ],
        vec![
            vec![Value::Integer(1), Value::Float(0.5)],
            vec![Value::Integer(3), Value::Float(1.5)],
        ],
    )
    .unwrap();

    let mut tables = IndexMap::new();
    tables.insert("left_side".to_string(), &left);
    tables.insert("right_side".to_string(), &right);

    let result = query::execute(
        "SELECT l.id, r.score FROM left_side l JOIN right_side r ON l.id = r.id ORDER BY l.id",
        &tables,
    )
    .unwrap();
    assert_eq!(result.row_count(), 2);
    assert_eq!(result.rows[1][1], Value::Float(1.5));
}

#[test]
fn test_df_alias_resolves_to_active_dataset() {
    let mut session = Session::with_defaults();
    session.register("first", numbers(4)).unwrap();
    session.register("second", numbers(9)).unwrap();

    // "first" is active; df points at it
    let result = session.execute_query("SELECT COUNT(*) AS n FROM df").unwrap();
    assert_eq!(result.rows[0][0], Value::Integer(4));

    session.set_active("second").unwrap();
    let result = session.execute_query("SELECT COUNT(*) AS n FROM df").unwrap();
    assert_eq!(result.rows[0][0], Value::Integer(9));
}

#[test]
fn test_dataset_named_df_shadows_alias() {
    let mut session = Session::with_defaults();
    session.register("other", numbers(4)).unwrap();
    session.register("df", numbers(7)).unwrap();

    // an explicit dataset named df wins over the active alias
    let result = session.execute_query("SELECT COUNT(*) AS n FROM df").unwrap();
    assert_eq!(result.rows[0][0], Value::Integer(7));
}

#[test]
fn test_query_history_records_executions() {
    let mut session = Session::with_defaults();
    session.register("data", numbers(5)).unwrap();

    session.execute_query("SELECT * FROM data").unwrap();
    session
        .execute_query("SELECT * FROM data WHERE id > 3")
        .unwrap();
    // failed queries are not recorded
    assert!(session.execute_query("SELEC nope").is_err());

    let history = session.query_history().all();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sequence, 1);
    assert_eq!(history[0].result_row_count, 5);
    assert_eq!(history[1].sequence, 2);
    assert_eq!(history[1].result_row_count, 2);
}

#[test]
fn test_trailing_semicolon_accepted() {
    let table = numbers(3);
    let result = query::execute("SELECT * FROM data;", &registry(&table)).unwrap();
    assert_eq!(result.row_count(), 3);
}
