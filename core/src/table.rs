//! In-memory table model: named, typed columns over ordered rows
//!
//! A [`Table`] is a plain value. No operation in this crate mutates one in
//! place; transforms and queries always produce a fresh `Table`, which is
//! what lets the session layer guarantee atomicity.

use crate::error::{GoldpanError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Cell types a column can carry. Every column is null-capable; a null cell
/// is a [`Value::Null`], not a separate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Boolean,
    Integer,
    Float,
    Text,
    Date,
    Timestamp,
}

impl DataType {
    /// DuckDB type name used when materializing a table into the engine
    pub fn duckdb_type(&self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Integer => "BIGINT",
            DataType::Float => "DOUBLE",
            DataType::Text => "VARCHAR",
            DataType::Date => "DATE",
            DataType::Timestamp => "TIMESTAMP",
        }
    }

    /// Map a DuckDB DESCRIBE type name back to a goldpan type.
    ///
    /// DuckDB reports a wider zoo of types than we model; everything
    /// unrecognized lands on `Text`, which is always renderable.
    pub fn from_duckdb_type(type_name: &str) -> Self {
        let upper = type_name.to_uppercase();
        if upper.contains("BOOL") {
            DataType::Boolean
        } else if upper.contains("INT") {
            DataType::Integer
        } else if upper.contains("DOUBLE")
            || upper.contains("FLOAT")
            || upper.contains("REAL")
            || upper.contains("DECIMAL")
        {
            DataType::Float
        } else if upper.contains("TIMESTAMP") || upper.contains("DATETIME") {
            DataType::Timestamp
        } else if upper == "DATE" {
            DataType::Date
        } else {
            DataType::Text
        }
    }

    /// Parse a user-facing type name (as accepted by the cast operator)
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "boolean" | "bool" => Ok(DataType::Boolean),
            "integer" | "int" => Ok(DataType::Integer),
            "float" | "double" => Ok(DataType::Float),
            "text" | "string" => Ok(DataType::Text),
            "date" => Ok(DataType::Date),
            "timestamp" | "datetime" => Ok(DataType::Timestamp),
            other => Err(GoldpanError::invalid_input(format!(
                "unknown data type: '{other}'"
            ))),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Integer | DataType::Float)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::Timestamp => "timestamp",
        };
        write!(f, "{name}")
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Human-readable rendering; nulls render as the empty string
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Timestamp(ts) => {
                if ts.and_utc().timestamp_subsec_micros() > 0 {
                    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
                } else {
                    ts.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
        }
    }

    /// Canonical token used for duplicate detection. Unlike `render`, this
    /// keeps nulls distinct from empty strings and tags each variant.
    fn dedup_token(&self) -> String {
        match self {
            Value::Null => "\u{1}null".to_string(),
            Value::Boolean(b) => format!("b:{b}"),
            Value::Integer(i) => format!("i:{i}"),
            Value::Float(f) => format!("f:{}", f.to_bits()),
            Value::Text(s) => format!("t:{s}"),
            Value::Date(d) => format!("d:{d}"),
            Value::Timestamp(ts) => format!("ts:{ts}"),
        }
    }
}

/// Name and type of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: DataType,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered sequence of named, typed columns plus an ordered sequence of
/// rows. Identity is by name within the dataset registry, not by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table, validating that every row matches the column count
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Vec<Value>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(GoldpanError::invalid_input(format!(
                    "row {i} has {} values but the table has {} columns",
                    row.len(),
                    columns.len()
                )));
            }
        }
        Ok(Self { columns, rows })
    }

    /// A table with the given schema and no rows
    pub fn empty(columns: Vec<ColumnInfo>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Column index, or `ColumnNotFound`
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| GoldpanError::column_not_found(name))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// True when both tables have the same column names and types in the
    /// same order
    pub fn schema_eq(&self, other: &Table) -> bool {
        self.columns == other.columns
    }

    /// Canonical key for a row, used for duplicate detection
    pub(crate) fn row_key(row: &[Value]) -> String {
        let tokens: Vec<String> = row.iter().map(|v| v.dedup_token()).collect();
        tokens.join("\u{1f}")
    }

    /// Number of rows that exactly duplicate an earlier row
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = std::collections::HashSet::with_capacity(self.rows.len());
        let mut duplicates = 0;
        for row in &self.rows {
            if !seen.insert(Self::row_key(row)) {
                duplicates += 1;
            }
        }
        duplicates
    }

    /// Total number of null cells across the whole table
    pub fn null_cell_count(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.iter().filter(|v| v.is_null()).count())
            .sum()
    }
}
