//! Output formatting utilities

use anyhow::Result;
use goldpan_core::profile::ProfileReport;
use goldpan_core::table::{Table, Value};

/// Print a quality report in a tree layout
pub fn print_profile_report(source: &str, report: &ProfileReport) {
    println!("📊 Quality Report: {source}");
    println!("├─ Rows: {}", report.row_count);
    println!("├─ Columns: {}", report.column_count);
    println!(
        "├─ Missing cells: {} of {}",
        report.missing_cells, report.total_cells
    );
    println!("├─ Duplicate rows: {}", report.duplicate_rows);
    println!("├─ Completeness: {:.1}%", report.completeness * 100.0);
    println!("├─ Uniqueness: {:.1}%", report.uniqueness * 100.0);
    println!("└─ Health score: {}/100", report.health);
    println!();

    for (i, column) in report.columns.iter().enumerate() {
        let prefix = if i == report.columns.len() - 1 {
            "└─"
        } else {
            "├─"
        };
        let samples = if column.sample_values.is_empty() {
            "-".to_string()
        } else {
            column.sample_values.join(", ")
        };
        println!(
            "{prefix} {} ({}): {} non-null, {} null, {} unique | e.g. {}",
            column.name,
            column.data_type,
            column.non_null_count,
            column.null_count,
            column.unique_values,
            samples
        );
    }
}

/// Print a result table with aligned columns
pub fn print_table_result(table: &Table) {
    let names = table.column_names();

    // Calculate column widths
    let mut col_widths: Vec<usize> = names.iter().map(|name| name.len()).collect();
    for row in &table.rows {
        for (i, value) in row.iter().enumerate() {
            col_widths[i] = col_widths[i].max(format_value(value).len());
        }
    }
    for width in &mut col_widths {
        *width = (*width).max(10);
    }

    // Print header
    let header: Vec<String> = names
        .iter()
        .zip(&col_widths)
        .map(|(name, &width)| format!("{name:<width$}"))
        .collect();
    println!("{}", header.join(" | "));

    let separator: Vec<String> = col_widths
        .iter()
        .map(|&width| "-".repeat(width))
        .collect();
    println!("{}", separator.join("-|-"));

    for row in &table.rows {
        let row_str: Vec<String> = row
            .iter()
            .zip(&col_widths)
            .map(|(value, &width)| {
                let rendered = format_value(value);
                format!("{rendered:<width$}")
            })
            .collect();
        println!("{}", row_str.join(" | "));
    }

    println!("\n📊 {} rows returned", table.row_count());
}

/// Print a result table as a JSON array of record objects
pub fn print_json_result(table: &Table) -> Result<()> {
    let names = table.column_names();
    let records: Vec<serde_json::Value> = table
        .rows
        .iter()
        .map(|row| {
            let mut record = serde_json::Map::new();
            for (name, value) in names.iter().zip(row) {
                record.insert(name.to_string(), value_to_json(value));
            }
            serde_json::Value::Object(record)
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn format_value(value: &Value) -> String {
    if value.is_null() {
        "null".to_string()
    } else {
        value.render()
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        other => serde_json::Value::String(other.render()),
    }
}
