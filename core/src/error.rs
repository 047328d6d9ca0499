//! Error types for goldpan operations

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, GoldpanError>;

/// All failure kinds a core operation can report.
///
/// Every public operation returns exactly one of these on failure and leaves
/// the session state (registry, transaction log, query history) untouched.
#[derive(Debug, Error)]
pub enum GoldpanError {
    /// Ingestion boundary failure: malformed file, unsupported encoding,
    /// connection failure
    #[error("ingestion failed: {message}")]
    Ingestion { message: String },

    /// The query engine rejected the query text itself
    #[error("SQL syntax error: {message}")]
    QuerySyntax { message: String },

    /// The query was well-formed but could not be executed (unknown table,
    /// unknown column, runtime failure)
    #[error("SQL execution error: {message}")]
    QueryExecution { message: String },

    /// Fill strategy cannot be applied to the column's type
    #[error("fill strategy '{strategy}' is not supported for column '{column}'")]
    UnsupportedFillStrategy { column: String, strategy: String },

    /// mean/median fill requested on a column with no non-null values
    #[error("cannot compute '{strategy}' for column '{column}': no non-null values")]
    InsufficientDataForFill { column: String, strategy: String },

    /// Operation requires a different column type
    #[error("type mismatch on column '{column}': expected {expected}, found {actual}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    /// A referenced column does not exist in the table
    #[error("column not found: '{column}'")]
    ColumnNotFound { column: String },

    /// A rename would produce two columns with the same name
    #[error("duplicate column name: '{column}'")]
    DuplicateColumnName { column: String },

    /// A value could not be converted to the requested type
    #[error("cannot cast value '{value}' (column '{column}', row {row}) to {target}")]
    CastFailure {
        column: String,
        row: usize,
        value: String,
        target: String,
    },

    /// Export format does not support the requested compression
    #[error("unsupported combination: {format} with {compression} compression")]
    UnsupportedCombination { format: String, compression: String },

    /// Registry lookup for an unknown dataset name
    #[error("dataset not found: '{name}'")]
    NotFound { name: String },

    /// Registration rejected because the name is taken and the overwrite
    /// policy requires explicit replacement
    #[error("dataset '{name}' already exists")]
    DuplicateDataset { name: String },

    /// A table with zero columns has nothing to profile
    #[error("cannot profile a table with no columns")]
    EmptyTableProfile,

    /// Invalid input provided by the caller
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DuckDB error
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl GoldpanError {
    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}
