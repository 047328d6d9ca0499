//! # goldpan-core
//!
//! Core library for goldpan - an interactive data-preparation engine for
//! loading, profiling, cleaning, querying, and exporting tabular datasets.
//!
//! This crate provides the core functionality that can be used by different
//! interfaces (CLI, web APIs, etc.).

pub mod audit;
pub mod error;
pub mod export;
pub mod ingest;
pub mod profile;
pub mod query;
pub mod registry;
pub mod session;
pub mod table;
pub mod transform;

// Re-export the most commonly used types for convenience
pub use audit::{OperationKind, QueryHistory, TransactionLog, TransactionLogEntry};
pub use error::{GoldpanError, Result};
pub use export::{Compression, ExportFormat, ExportOptions};
pub use ingest::{IngestFormat, IngestOptions, Ingestor};
pub use profile::{ColumnProfile, HealthWeights, ProfileReport};
pub use registry::{DatasetRegistry, DatasetSummary, OverwritePolicy};
pub use session::{Session, Settings};
pub use table::{ColumnInfo, DataType, Table, Value};
pub use transform::{FillStrategy, TransformOp};
