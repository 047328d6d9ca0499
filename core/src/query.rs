//! Query engine adapter backed by an embedded DuckDB connection
//!
//! Every call materializes the registered tables into a fresh in-memory
//! connection, runs the query, and extracts the result as a new [`Table`].
//! The adapter never touches the registry; from the session's perspective it
//! is a pure function of the query text and the table mapping.

use crate::error::{GoldpanError, Result};
use crate::table::{ColumnInfo, DataType, Table, Value};
use duckdb::types::ValueRef;
use duckdb::Connection;
use indexmap::IndexMap;

/// Open an in-memory connection with the engine settings we rely on.
///
/// Insertion order is deliberately left preserved (DuckDB's default): row
/// order of registered tables is contractual for LIMIT-style queries.
pub(crate) fn open_connection() -> Result<Connection> {
    let connection = Connection::open_in_memory()?;
    connection.execute("SET memory_limit='4GB'", [])?;
    connection.execute("SET enable_progress_bar=false", [])?;
    Ok(connection)
}

/// Quote an identifier for use in generated SQL
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Materialize a table under the given name inside the connection.
///
/// Values are bound as rendered strings and DuckDB casts them into the
/// declared column types; nulls are bound as SQL NULL.
pub(crate) fn materialize_table(connection: &Connection, name: &str, table: &Table) -> Result<()> {
    if table.column_count() == 0 {
        return Ok(());
    }

    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|col| format!("{} {}", quote_ident(&col.name), col.data_type.duckdb_type()))
        .collect();
    let create_sql = format!(
        "CREATE OR REPLACE TABLE {} ({})",
        quote_ident(name),
        column_defs.join(", ")
    );
    connection.execute(&create_sql, [])?;

    if table.rows.is_empty() {
        return Ok(());
    }

    let placeholders: Vec<&str> = table.columns.iter().map(|_| "?").collect();
    let insert_sql = format!(
        "INSERT INTO {} VALUES ({})",
        quote_ident(name),
        placeholders.join(", ")
    );
    let mut stmt = connection.prepare(&insert_sql)?;

    for row in &table.rows {
        let bound: Vec<Option<String>> = row
            .iter()
            .map(|value| {
                if value.is_null() {
                    None
                } else {
                    Some(value.render())
                }
            })
            .collect();
        let params: Vec<&dyn duckdb::ToSql> =
            bound.iter().map(|v| v as &dyn duckdb::ToSql).collect();
        stmt.execute(&params[..])?;
    }

    Ok(())
}

/// Run a SELECT and extract a typed table, DESCRIBE-first for the schema
pub(crate) fn extract_table(connection: &Connection, sql: &str) -> Result<Table> {
    let describe_sql = format!("DESCRIBE {sql}");
    let mut describe_stmt = connection
        .prepare(&describe_sql)
        .map_err(classify_engine_error)?;

    let described = describe_stmt
        .query_map([], |row| {
            let name: String = row.get(0)?;
            let type_name: String = row.get(1)?;
            Ok((name, type_name))
        })
        .map_err(classify_engine_error)?;

    let mut columns = Vec::new();
    for row_result in described {
        let (name, type_name) = row_result.map_err(classify_engine_error)?;
        columns.push(ColumnInfo::new(name, DataType::from_duckdb_type(&type_name)));
    }

    let column_count = columns.len();
    let mut stmt = connection.prepare(sql).map_err(classify_engine_error)?;
    let mapped = stmt
        .query_map([], |row| {
            let mut values = Vec::with_capacity(column_count);
            for i in 0..column_count {
                values.push(convert_value(row.get_ref(i)?));
            }
            Ok(values)
        })
        .map_err(classify_engine_error)?;

    let mut rows = Vec::new();
    for row_result in mapped {
        rows.push(row_result.map_err(classify_engine_error)?);
    }

    Ok(Table { columns, rows })
}

/// Convert one engine value into a cell value
fn convert_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Boolean(b),
        ValueRef::TinyInt(i) => Value::Integer(i as i64),
        ValueRef::SmallInt(i) => Value::Integer(i as i64),
        ValueRef::Int(i) => Value::Integer(i as i64),
        ValueRef::BigInt(i) => Value::Integer(i),
        ValueRef::HugeInt(i) => match i64::try_from(i) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Text(i.to_string()),
        },
        ValueRef::UTinyInt(i) => Value::Integer(i as i64),
        ValueRef::USmallInt(i) => Value::Integer(i as i64),
        ValueRef::UInt(i) => Value::Integer(i as i64),
        ValueRef::UBigInt(i) => match i64::try_from(i) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Text(i.to_string()),
        },
        ValueRef::Float(f) => Value::Float(f as f64),
        ValueRef::Double(f) => Value::Float(f),
        ValueRef::Decimal(d) => Value::Float(d.to_string().parse::<f64>().unwrap_or_default()),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => Value::Text(format!("<blob:{} bytes>", b.len())),
        ValueRef::Date32(d) => {
            let epoch = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
            Value::Date(epoch + chrono::Duration::days(d as i64))
        }
        ValueRef::Timestamp(unit, raw) => {
            let micros = match unit {
                duckdb::types::TimeUnit::Second => raw.saturating_mul(1_000_000),
                duckdb::types::TimeUnit::Millisecond => raw.saturating_mul(1_000),
                duckdb::types::TimeUnit::Microsecond => raw,
                duckdb::types::TimeUnit::Nanosecond => raw / 1_000,
            };
            let seconds = micros.div_euclid(1_000_000);
            let sub_micros = micros.rem_euclid(1_000_000);
            match chrono::DateTime::from_timestamp(seconds, (sub_micros * 1_000) as u32) {
                Some(dt) => Value::Timestamp(dt.naive_utc()),
                None => Value::Null,
            }
        }
        ValueRef::Time64(_, t) => {
            let total_seconds = t / 1_000_000;
            let hours = total_seconds / 3600;
            let minutes = (total_seconds % 3600) / 60;
            let seconds = total_seconds % 60;
            Value::Text(format!("{hours:02}:{minutes:02}:{seconds:02}"))
        }
        _ => Value::Text("<unknown>".to_string()),
    }
}

/// Split engine diagnostics into syntax vs execution failures. Both carry
/// the engine's message through to the caller.
fn classify_engine_error(error: duckdb::Error) -> GoldpanError {
    let message = error.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("parser error") || lowered.contains("syntax error") {
        GoldpanError::QuerySyntax { message }
    } else {
        GoldpanError::QueryExecution { message }
    }
}

/// Execute a query against the given set of named tables.
///
/// The caller decides whether to register the result as a new dataset; this
/// function has no side effects on anything it is handed.
pub fn execute(query_text: &str, tables: &IndexMap<String, &Table>) -> Result<Table> {
    let connection = open_connection()?;
    for (name, table) in tables {
        materialize_table(&connection, name, table)?;
    }
    log::debug!(
        "executing query against {} registered table(s): {}",
        tables.len(),
        query_text
    );
    extract_table(&connection, query_text.trim().trim_end_matches(';'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnInfo, DataType};

    fn people() -> Table {
        Table::new(
            vec![
                ColumnInfo::new("id", DataType::Integer),
                ColumnInfo::new("name", DataType::Text),
                ColumnInfo::new("score", DataType::Float),
            ],
            vec![
                vec![
                    Value::Integer(1),
                    Value::Text("ada".into()),
                    Value::Float(9.5),
                ],
                vec![Value::Integer(2), Value::Text("grace".into()), Value::Null],
                vec![
                    Value::Integer(3),
                    Value::Text("edsger".into()),
                    Value::Float(8.0),
                ],
            ],
        )
        .unwrap()
    }

    fn single(name: &str, table: &Table) -> Table {
        let mut tables = IndexMap::new();
        tables.insert(name.to_string(), table);
        execute(&format!("SELECT * FROM {name}"), &tables).unwrap()
    }

    #[test]
    fn test_round_trip_preserves_rows_and_schema() {
        let table = people();
        let result = single("people", &table);
        assert!(result.schema_eq(&table));
        assert_eq!(result.rows, table.rows);
    }

    #[test]
    fn test_limit_preserves_leading_order() {
        let table = people();
        let mut tables = IndexMap::new();
        tables.insert("people".to_string(), &table);
        let result = execute("SELECT * FROM people LIMIT 2", &tables).unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(result.rows[0], table.rows[0]);
        assert_eq!(result.rows[1], table.rows[1]);
    }

    #[test]
    fn test_syntax_error_classification() {
        let table = people();
        let mut tables = IndexMap::new();
        tables.insert("people".to_string(), &table);
        let err = execute("SELEC * FROM people", &tables).unwrap_err();
        assert!(matches!(err, GoldpanError::QuerySyntax { .. }));
    }

    #[test]
    fn test_unknown_table_is_execution_error() {
        let table = people();
        let mut tables = IndexMap::new();
        tables.insert("people".to_string(), &table);
        let err = execute("SELECT * FROM missing", &tables).unwrap_err();
        assert!(matches!(err, GoldpanError::QueryExecution { .. }));
    }

    #[test]
    fn test_zero_row_result_keeps_schema() {
        let table = people();
        let mut tables = IndexMap::new();
        tables.insert("people".to_string(), &table);
        let result = execute("SELECT id, name FROM people WHERE id > 100", &tables).unwrap();
        assert_eq!(result.row_count(), 0);
        assert_eq!(result.column_count(), 2);
        assert_eq!(result.columns[0].data_type, DataType::Integer);
    }

    #[test]
    fn test_quoted_identifiers_survive_materialization() {
        let table = Table::new(
            vec![ColumnInfo::new("weird name", DataType::Text)],
            vec![vec![Value::Text("x\"y".into())]],
        )
        .unwrap();
        let mut tables = IndexMap::new();
        tables.insert("data".to_string(), &table);
        let result = execute("SELECT \"weird name\" FROM data", &tables).unwrap();
        assert_eq!(result.rows[0][0], Value::Text("x\"y".into()));
    }
}
