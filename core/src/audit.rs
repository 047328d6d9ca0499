//! Append-only audit state: the transaction log and the query history

use crate::table::{ColumnInfo, DataType, Table, Value};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// Kinds of operations recorded in the transaction log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Ingest,
    Query,
    Dedup,
    FillMissing,
    TrimWhitespace,
    RenameColumns,
    CastColumn,
    Export,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OperationKind::Ingest => "ingest",
            OperationKind::Query => "query",
            OperationKind::Dedup => "dedup",
            OperationKind::FillMissing => "fill_missing",
            OperationKind::TrimWhitespace => "trim_whitespace",
            OperationKind::RenameColumns => "rename_columns",
            OperationKind::CastColumn => "cast_column",
            OperationKind::Export => "export",
        };
        write!(f, "{name}")
    }
}

/// One committed operation. Immutable once appended.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionLogEntry {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub operation: OperationKind,
    pub parameters: IndexMap<String, String>,
    pub source_dataset: String,
    pub result_dataset: String,
    pub rows_before: u64,
    pub rows_after: u64,
}

/// Append-only, ordered record of every operation applied in a session
#[derive(Debug, Default)]
pub struct TransactionLog {
    entries: Vec<TransactionLogEntry>,
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, stamping it with the next sequence number (starting
    /// at 1) and the current time. Returns the assigned sequence number.
    #[allow(clippy::too_many_arguments)]
    pub fn append(
        &mut self,
        operation: OperationKind,
        parameters: IndexMap<String, String>,
        source_dataset: impl Into<String>,
        result_dataset: impl Into<String>,
        rows_before: u64,
        rows_after: u64,
    ) -> u64 {
        let sequence = self.entries.len() as u64 + 1;
        self.entries.push(TransactionLogEntry {
            sequence,
            timestamp: Utc::now(),
            operation,
            parameters,
            source_dataset: source_dataset.into(),
            result_dataset: result_dataset.into(),
            rows_before,
            rows_after,
        });
        sequence
    }

    /// All entries, ordered by sequence number
    pub fn all(&self) -> &[TransactionLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten the log into a table for audit export. Parameters become a
    /// JSON object string, one entry per row.
    pub fn export_as_table(&self) -> Table {
        let columns = vec![
            ColumnInfo::new("sequence", DataType::Integer),
            ColumnInfo::new("timestamp", DataType::Timestamp),
            ColumnInfo::new("operation", DataType::Text),
            ColumnInfo::new("parameters", DataType::Text),
            ColumnInfo::new("source_dataset", DataType::Text),
            ColumnInfo::new("result_dataset", DataType::Text),
            ColumnInfo::new("rows_before", DataType::Integer),
            ColumnInfo::new("rows_after", DataType::Integer),
        ];
        let rows = self
            .entries
            .iter()
            .map(|entry| {
                let parameters = serde_json::to_string(&entry.parameters)
                    .unwrap_or_else(|_| "{}".to_string());
                vec![
                    Value::Integer(entry.sequence as i64),
                    Value::Timestamp(entry.timestamp.naive_utc()),
                    Value::Text(entry.operation.to_string()),
                    Value::Text(parameters),
                    Value::Text(entry.source_dataset.clone()),
                    Value::Text(entry.result_dataset.clone()),
                    Value::Integer(entry.rows_before as i64),
                    Value::Integer(entry.rows_after as i64),
                ]
            })
            .collect();
        Table { columns, rows }
    }
}

/// One executed SQL query
#[derive(Debug, Clone, Serialize)]
pub struct QueryHistoryEntry {
    pub sequence: u64,
    pub query_text: String,
    pub timestamp: DateTime<Utc>,
    pub result_row_count: u64,
}

/// Append-only record of queries executed in a session, independent of the
/// transaction log
#[derive(Debug, Default)]
pub struct QueryHistory {
    entries: Vec<QueryHistoryEntry>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, query_text: impl Into<String>, result_row_count: u64) -> u64 {
        let sequence = self.entries.len() as u64 + 1;
        self.entries.push(QueryHistoryEntry {
            sequence,
            query_text: query_text.into(),
            timestamp: Utc::now(),
            result_row_count,
        });
        sequence
    }

    pub fn all(&self) -> &[QueryHistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
