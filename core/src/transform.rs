//! The transform operator catalog: dedup, fill, trim, rename, cast
//!
//! Each operator is a pure `Table -> Table` function. Failures happen before
//! anything is produced, so the session layer can commit the result and the
//! matching log entry together or not at all.

use crate::audit::OperationKind;
use crate::error::{GoldpanError, Result};
use crate::table::{ColumnInfo, DataType, Table, Value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How `fill_missing` replaces nulls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    /// Carry the last non-null value forward; leading nulls stay
    Forward,
    /// Carry the next non-null value backward; trailing nulls stay
    Backward,
    /// Fill with 0 / 0.0 / "0" depending on the column type
    Zero,
    /// Fill with the mean of the column's non-null values
    Mean,
    /// Fill with the median of the column's non-null values
    Median,
}

impl FillStrategy {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "forward" | "ffill" => Ok(FillStrategy::Forward),
            "backward" | "bfill" => Ok(FillStrategy::Backward),
            "zero" => Ok(FillStrategy::Zero),
            "mean" => Ok(FillStrategy::Mean),
            "median" => Ok(FillStrategy::Median),
            other => Err(GoldpanError::invalid_input(format!(
                "unknown fill strategy: '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FillStrategy::Forward => "forward",
            FillStrategy::Backward => "backward",
            FillStrategy::Zero => "zero",
            FillStrategy::Mean => "mean",
            FillStrategy::Median => "median",
        };
        write!(f, "{name}")
    }
}

/// A parameterized transform operation on the active dataset
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    /// Remove rows that exactly duplicate an earlier row, keeping the first
    /// occurrence and the remaining row order
    Dedup,
    /// Replace nulls in one column according to a strategy
    FillMissing {
        column: String,
        strategy: FillStrategy,
    },
    /// Strip leading/trailing whitespace from text columns; `None` means
    /// every text column
    TrimWhitespace { columns: Option<Vec<String>> },
    /// Rename columns by an old-name to new-name mapping
    RenameColumns { mapping: IndexMap<String, String> },
    /// Convert every value in a column to the target type
    CastColumn { column: String, target: DataType },
}

impl TransformOp {
    /// Operation kind recorded in the transaction log
    pub fn kind(&self) -> OperationKind {
        match self {
            TransformOp::Dedup => OperationKind::Dedup,
            TransformOp::FillMissing { .. } => OperationKind::FillMissing,
            TransformOp::TrimWhitespace { .. } => OperationKind::TrimWhitespace,
            TransformOp::RenameColumns { .. } => OperationKind::RenameColumns,
            TransformOp::CastColumn { .. } => OperationKind::CastColumn,
        }
    }

    /// Parameters recorded in the transaction log
    pub fn parameters(&self) -> IndexMap<String, String> {
        let mut params = IndexMap::new();
        match self {
            TransformOp::Dedup => {}
            TransformOp::FillMissing { column, strategy } => {
                params.insert("column".to_string(), column.clone());
                params.insert("strategy".to_string(), strategy.to_string());
            }
            TransformOp::TrimWhitespace { columns } => {
                let rendered = match columns {
                    Some(names) => names.join(","),
                    None => "<all text columns>".to_string(),
                };
                params.insert("columns".to_string(), rendered);
            }
            TransformOp::RenameColumns { mapping } => {
                for (old, new) in mapping {
                    params.insert(old.clone(), new.clone());
                }
            }
            TransformOp::CastColumn { column, target } => {
                params.insert("column".to_string(), column.clone());
                params.insert("target".to_string(), target.to_string());
            }
        }
        params
    }
}

/// Apply an operator to a table, producing a new table
pub fn apply(table: &Table, op: &TransformOp) -> Result<Table> {
    match op {
        TransformOp::Dedup => Ok(dedup(table)),
        TransformOp::FillMissing { column, strategy } => fill_missing(table, column, *strategy),
        TransformOp::TrimWhitespace { columns } => trim_whitespace(table, columns.as_deref()),
        TransformOp::RenameColumns { mapping } => rename_columns(table, mapping),
        TransformOp::CastColumn { column, target } => cast_column(table, column, *target),
    }
}

fn dedup(table: &Table) -> Table {
    let mut seen = HashSet::with_capacity(table.rows.len());
    let rows = table
        .rows
        .iter()
        .filter(|row| seen.insert(Table::row_key(row)))
        .cloned()
        .collect();
    Table {
        columns: table.columns.clone(),
        rows,
    }
}

fn fill_missing(table: &Table, column: &str, strategy: FillStrategy) -> Result<Table> {
    let index = table.require_column(column)?;
    let data_type = table.columns[index].data_type;

    match strategy {
        FillStrategy::Forward => Ok(fill_directional(table, index, false)),
        FillStrategy::Backward => Ok(fill_directional(table, index, true)),
        FillStrategy::Zero => {
            let fill = match data_type {
                DataType::Integer => Value::Integer(0),
                DataType::Float => Value::Float(0.0),
                DataType::Text => Value::Text("0".to_string()),
                _ => {
                    return Err(GoldpanError::UnsupportedFillStrategy {
                        column: column.to_string(),
                        strategy: strategy.to_string(),
                    })
                }
            };
            Ok(fill_constant(table, index, fill, data_type))
        }
        FillStrategy::Mean | FillStrategy::Median => {
            if !data_type.is_numeric() {
                return Err(GoldpanError::UnsupportedFillStrategy {
                    column: column.to_string(),
                    strategy: strategy.to_string(),
                });
            }
            let mut values: Vec<f64> = table
                .rows
                .iter()
                .filter_map(|row| row[index].as_f64())
                .collect();
            if values.is_empty() {
                return Err(GoldpanError::InsufficientDataForFill {
                    column: column.to_string(),
                    strategy: strategy.to_string(),
                });
            }
            let statistic = if strategy == FillStrategy::Mean {
                values.iter().sum::<f64>() / values.len() as f64
            } else {
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let mid = values.len() / 2;
                if values.len() % 2 == 1 {
                    values[mid]
                } else {
                    (values[mid - 1] + values[mid]) / 2.0
                }
            };

            // An integral statistic fills an integer column in place; a
            // fractional one promotes the column to float.
            if data_type == DataType::Integer && statistic.fract() == 0.0 {
                Ok(fill_constant(
                    table,
                    index,
                    Value::Integer(statistic as i64),
                    DataType::Integer,
                ))
            } else if data_type == DataType::Integer {
                let mut result = fill_constant(table, index, Value::Float(statistic), DataType::Float);
                for row in &mut result.rows {
                    if let Value::Integer(i) = row[index] {
                        row[index] = Value::Float(i as f64);
                    }
                }
                Ok(result)
            } else {
                Ok(fill_constant(
                    table,
                    index,
                    Value::Float(statistic),
                    DataType::Float,
                ))
            }
        }
    }
}

fn fill_constant(table: &Table, index: usize, fill: Value, new_type: DataType) -> Table {
    let mut result = table.clone();
    result.columns[index].data_type = new_type;
    for row in &mut result.rows {
        if row[index].is_null() {
            row[index] = fill.clone();
        }
    }
    result
}

fn fill_directional(table: &Table, index: usize, backward: bool) -> Table {
    let mut result = table.clone();
    let mut carried: Option<Value> = None;
    let row_count = result.rows.len();
    for i in 0..row_count {
        let at = if backward { row_count - 1 - i } else { i };
        if result.rows[at][index].is_null() {
            if let Some(value) = &carried {
                result.rows[at][index] = value.clone();
            }
        } else {
            carried = Some(result.rows[at][index].clone());
        }
    }
    result
}

fn trim_whitespace(table: &Table, columns: Option<&[String]>) -> Result<Table> {
    let targets: Vec<usize> = match columns {
        Some(names) => {
            let mut indices = Vec::with_capacity(names.len());
            for name in names {
                let index = table.require_column(name)?;
                let data_type = table.columns[index].data_type;
                if data_type != DataType::Text {
                    return Err(GoldpanError::TypeMismatch {
                        column: name.clone(),
                        expected: DataType::Text.to_string(),
                        actual: data_type.to_string(),
                    });
                }
                indices.push(index);
            }
            indices
        }
        None => table
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.data_type == DataType::Text)
            .map(|(i, _)| i)
            .collect(),
    };

    let mut result = table.clone();
    for row in &mut result.rows {
        for &index in &targets {
            if let Value::Text(s) = &row[index] {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    row[index] = Value::Text(trimmed.to_string());
                }
            }
        }
    }
    Ok(result)
}

fn rename_columns(table: &Table, mapping: &IndexMap<String, String>) -> Result<Table> {
    for old in mapping.keys() {
        table.require_column(old)?;
    }

    let mut result = table.clone();
    for col in &mut result.columns {
        if let Some(new) = mapping.get(&col.name) {
            col.name = new.clone();
        }
    }

    let mut seen = HashSet::new();
    for col in &result.columns {
        if !seen.insert(col.name.as_str()) {
            return Err(GoldpanError::DuplicateColumnName {
                column: col.name.clone(),
            });
        }
    }
    Ok(result)
}

fn cast_column(table: &Table, column: &str, target: DataType) -> Result<Table> {
    let index = table.require_column(column)?;
    if table.columns[index].data_type == target {
        return Ok(table.clone());
    }

    let mut columns = table.columns.clone();
    columns[index] = ColumnInfo::new(column, target);

    let mut rows = Vec::with_capacity(table.rows.len());
    for (row_index, row) in table.rows.iter().enumerate() {
        let mut new_row = row.clone();
        new_row[index] = cast_value(&row[index], target).ok_or_else(|| {
            GoldpanError::CastFailure {
                column: column.to_string(),
                row: row_index,
                value: row[index].render(),
                target: target.to_string(),
            }
        })?;
        rows.push(new_row);
    }

    Ok(Table { columns, rows })
}

/// Convert a single value, or `None` when the value cannot represent the
/// target type. Nulls survive every cast.
fn cast_value(value: &Value, target: DataType) -> Option<Value> {
    if value.is_null() {
        return Some(Value::Null);
    }
    match target {
        DataType::Text => Some(Value::Text(value.render())),
        DataType::Integer => match value {
            Value::Integer(i) => Some(Value::Integer(*i)),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(Value::Integer(*f as i64)),
            Value::Boolean(b) => Some(Value::Integer(i64::from(*b))),
            Value::Text(s) => s.trim().parse::<i64>().ok().map(Value::Integer),
            _ => None,
        },
        DataType::Float => match value {
            Value::Float(f) => Some(Value::Float(*f)),
            Value::Integer(i) => Some(Value::Float(*i as f64)),
            Value::Boolean(b) => Some(Value::Float(if *b { 1.0 } else { 0.0 })),
            Value::Text(s) => s.trim().parse::<f64>().ok().map(Value::Float),
            _ => None,
        },
        DataType::Boolean => match value {
            Value::Boolean(b) => Some(Value::Boolean(*b)),
            Value::Integer(0) => Some(Value::Boolean(false)),
            Value::Integer(1) => Some(Value::Boolean(true)),
            Value::Text(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" => Some(Value::Boolean(true)),
                "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
            _ => None,
        },
        DataType::Date => match value {
            Value::Date(d) => Some(Value::Date(*d)),
            Value::Timestamp(ts) => Some(Value::Date(ts.date())),
            Value::Text(s) => chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            _ => None,
        },
        DataType::Timestamp => match value {
            Value::Timestamp(ts) => Some(Value::Timestamp(*ts)),
            Value::Date(d) => d.and_hms_opt(0, 0, 0).map(Value::Timestamp),
            Value::Text(s) => {
                let trimmed = s.trim();
                chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
                    .or_else(|_| {
                        chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                    })
                    .ok()
                    .map(Value::Timestamp)
                    .or_else(|| {
                        chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                            .ok()
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                            .map(Value::Timestamp)
                    })
            }
            _ => None,
        },
    }
}
