//! Workspace session: the stateful surface that the CLI (or any embedding
//! application) drives
//!
//! A [`Session`] owns the dataset registry, the transaction log, the query
//! history, and the ingest cache. Every mutating operation goes through it so
//! the log stays consistent with the registry: a transform only lands in the
//! registry after its log entry has been appended, and a failed transform
//! leaves both untouched.

use crate::audit::{OperationKind, QueryHistory, TransactionLog, TransactionLogEntry};
use crate::error::{GoldpanError, Result};
use crate::export::{self, Compression, ExportFormat, ExportOptions};
use crate::ingest::{IngestCache, IngestOptions, Ingestor};
use crate::profile::{self, HealthWeights, ProfileReport};
use crate::query;
use crate::registry::{DatasetRegistry, DatasetSummary, OverwritePolicy};
use crate::table::Table;
use crate::transform::{self, TransformOp};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// Name a query result is aliased under when it refers to the active dataset
const ACTIVE_ALIAS: &str = "df";

/// Tunable session settings, loadable from a TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Weights for the dataset health score
    pub health_weights: HealthWeights,
    /// What happens when a dataset name is registered twice
    pub overwrite_policy: OverwritePolicy,
    /// Default CSV export options
    pub csv_header: bool,
    pub csv_delimiter: char,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            health_weights: HealthWeights::default(),
            overwrite_policy: OverwritePolicy::default(),
            csv_header: true,
            csv_delimiter: ',',
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults for any
    /// missing keys
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| GoldpanError::invalid_input(format!("invalid settings file: {e}")))
    }

    /// Load from the given path if it exists, otherwise defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn export_options(&self) -> ExportOptions {
        ExportOptions {
            include_header: self.csv_header,
            delimiter: self.csv_delimiter,
        }
    }
}

/// A stateful data-preparation session
pub struct Session {
    registry: DatasetRegistry,
    log: TransactionLog,
    history: QueryHistory,
    cache: IngestCache,
    settings: Settings,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            registry: DatasetRegistry::new(settings.overwrite_policy),
            log: TransactionLog::new(),
            history: QueryHistory::new(),
            cache: IngestCache::new(),
            settings,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(Settings::default())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // --- registry access ---

    pub fn register(&mut self, name: &str, table: Table) -> Result<()> {
        self.registry.register(name, table)
    }

    pub fn dataset(&self, name: &str) -> Result<&Table> {
        self.registry.get(name)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.registry.active_name()
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        self.registry.set_active(name)
    }

    pub fn list_datasets(&self) -> Vec<DatasetSummary> {
        self.registry.list()
    }

    pub fn remove_dataset(&mut self, name: &str) -> Result<()> {
        self.registry.remove(name)
    }

    // --- ingestion ---

    /// Load a file into the registry under the given dataset name
    pub fn ingest_file(&mut self, path: &Path, name: &str, options: &IngestOptions) -> Result<()> {
        let key = IngestCache::file_key(path, options)?;
        let table = match self.cache.get(&key) {
            Some(cached) => {
                log::debug!("ingest cache hit for {}", path.display());
                cached
            }
            None => {
                let ingestor = Ingestor::new()?;
                let table = ingestor.load_file(path, options)?;
                self.cache.store(key, table.clone());
                table
            }
        };
        let rows = table.row_count() as u64;
        self.registry.register(name, table)?;

        let mut parameters = IndexMap::new();
        parameters.insert("path".to_string(), path.display().to_string());
        if let Some(format) = options.format {
            parameters.insert("format".to_string(), format.to_string());
        }
        if let Some(sheet) = &options.sheet {
            parameters.insert("sheet".to_string(), sheet.clone());
        }
        self.log
            .append(OperationKind::Ingest, parameters, "", name, 0, rows);
        log::info!("ingested '{}' ({} rows)", name, rows);
        Ok(())
    }

    /// Load a table from an external database into the registry
    pub fn ingest_database(
        &mut self,
        connection_string: &str,
        source_table: &str,
        name: &str,
    ) -> Result<()> {
        let ingestor = Ingestor::new()?;
        let select = format!("SELECT * FROM {source_table}");
        let table = ingestor.load_database(connection_string, &select)?;
        let rows = table.row_count() as u64;
        self.registry.register(name, table)?;

        let mut parameters = IndexMap::new();
        parameters.insert("source_table".to_string(), source_table.to_string());
        self.log
            .append(OperationKind::Ingest, parameters, "", name, 0, rows);
        Ok(())
    }

    // --- queries ---

    /// Execute a SQL query over the registered datasets. The active dataset
    /// is additionally visible under the `df` alias unless a dataset of that
    /// name already exists.
    pub fn execute_query(&mut self, query_text: &str) -> Result<Table> {
        let mut tables = self.registry.tables();
        if !tables.contains_key(ACTIVE_ALIAS) {
            if let Ok(active) = self.registry.active_table() {
                tables.insert(ACTIVE_ALIAS.to_string(), active);
            }
        }
        let result = query::execute(query_text, &tables)?;
        self.history
            .append(query_text, result.row_count() as u64);
        Ok(result)
    }

    /// Register a query result as a named dataset and make it active
    pub fn save_query_result(&mut self, name: &str, query_text: &str, result: Table) -> Result<()> {
        let rows = result.row_count() as u64;
        self.registry.register(name, result)?;
        self.registry.set_active(name)?;

        let mut parameters = IndexMap::new();
        parameters.insert("query".to_string(), query_text.to_string());
        self.log
            .append(OperationKind::Query, parameters, "", name, 0, rows);
        Ok(())
    }

    pub fn query_history(&self) -> &QueryHistory {
        &self.history
    }

    // --- profiling ---

    /// Profile a named dataset
    pub fn profile_dataset(&self, name: &str) -> Result<ProfileReport> {
        let table = self.registry.get(name)?;
        profile::profile(table, &self.settings.health_weights)
    }

    /// Profile the active dataset
    pub fn profile_active(&self) -> Result<ProfileReport> {
        let name = self
            .registry
            .active_name()
            .ok_or_else(|| GoldpanError::invalid_input("no active dataset"))?;
        self.profile_dataset(name)
    }

    // --- transforms ---

    /// Apply a transform to a named dataset, replacing it in place. The
    /// registry and log are only touched if the transform succeeds.
    pub fn apply_transform(&mut self, name: &str, op: &TransformOp) -> Result<()> {
        let before = self.registry.get(name)?;
        let rows_before = before.row_count() as u64;
        let after = transform::apply(before, op)?;
        let rows_after = after.row_count() as u64;

        self.log.append(
            op.kind(),
            op.parameters(),
            name,
            name,
            rows_before,
            rows_after,
        );
        self.registry.replace(name, after)?;
        log::info!(
            "applied {} to '{}' ({} -> {} rows)",
            op.kind(),
            name,
            rows_before,
            rows_after
        );
        Ok(())
    }

    /// Apply a sequence of transforms to a named dataset. Stops at the first
    /// failure; earlier steps in the sequence remain applied.
    pub fn apply_pipeline(&mut self, name: &str, ops: &[TransformOp]) -> Result<()> {
        for op in ops {
            self.apply_transform(name, op)?;
        }
        Ok(())
    }

    // --- export ---

    /// Export a named dataset to a file, logging the export
    pub fn export_dataset(
        &mut self,
        name: &str,
        path: &Path,
        compression: Option<Compression>,
    ) -> Result<()> {
        let table = self.registry.get(name)?;
        let rows = table.row_count() as u64;
        let options = self.settings.export_options();
        export::export_to_path(table, path, compression, &options)?;

        let (format, detected) = export::detect_from_path(path)?;
        let mut parameters = IndexMap::new();
        parameters.insert("path".to_string(), path.display().to_string());
        parameters.insert("format".to_string(), format.to_string());
        parameters.insert(
            "compression".to_string(),
            compression.unwrap_or(detected).to_string(),
        );
        self.log
            .append(OperationKind::Export, parameters, name, "", rows, rows);
        Ok(())
    }

    /// Export a named dataset and return the bytes instead of writing a file
    pub fn export_dataset_bytes(
        &self,
        name: &str,
        format: ExportFormat,
        compression: Compression,
    ) -> Result<Vec<u8>> {
        let table = self.registry.get(name)?;
        let options = self.settings.export_options();
        export::export_bytes(table, format, compression, &options)
    }

    // --- audit ---

    pub fn transaction_log(&self) -> &[TransactionLogEntry] {
        self.log.all()
    }

    /// Export the transaction log itself as a CSV file
    pub fn export_log(&self, path: &Path) -> Result<()> {
        let table = self.log.export_as_table();
        export::export_to_path(&table, path, None, &ExportOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ColumnInfo, DataType, Value};

    fn sample_table() -> Table {
        Table::new(
            vec![
                ColumnInfo::new("id", DataType::Integer),
                ColumnInfo::new("name", DataType::Text),
            ],
            vec![
                vec![Value::Integer(1), Value::Text("alpha".into())],
                vec![Value::Integer(2), Value::Text("beta".into())],
                vec![Value::Integer(2), Value::Text("beta".into())],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_first_registered_becomes_active() {
        let mut session = Session::with_defaults();
        session.register("first", sample_table()).unwrap();
        session.register("second", sample_table()).unwrap();
        assert_eq!(session.active_name(), Some("first"));
    }

    #[test]
    fn test_transform_logs_and_replaces() {
        let mut session = Session::with_defaults();
        session.register("data", sample_table()).unwrap();
        session
            .apply_transform("data", &TransformOp::Dedup)
            .unwrap();

        assert_eq!(session.dataset("data").unwrap().row_count(), 2);
        let log = session.transaction_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].operation, OperationKind::Dedup);
        assert_eq!(log[0].rows_before, 3);
        assert_eq!(log[0].rows_after, 2);
    }

    #[test]
    fn test_failed_transform_leaves_state_untouched() {
        let mut session = Session::with_defaults();
        session.register("data", sample_table()).unwrap();
        let op = TransformOp::RenameColumns {
            mapping: indexmap::indexmap! { "missing".to_string() => "other".to_string() },
        };
        assert!(session.apply_transform("data", &op).is_err());
        assert_eq!(session.dataset("data").unwrap().row_count(), 3);
        assert!(session.transaction_log().is_empty());
    }

    #[test]
    fn test_query_uses_df_alias_for_active() {
        let mut session = Session::with_defaults();
        session.register("data", sample_table()).unwrap();
        let result = session.execute_query("SELECT COUNT(*) AS n FROM df").unwrap();
        assert_eq!(result.rows[0][0], Value::Integer(3));
        assert_eq!(session.query_history().all().len(), 1);
    }

    #[test]
    fn test_save_query_result_sets_active() {
        let mut session = Session::with_defaults();
        session.register("data", sample_table()).unwrap();
        let result = session.execute_query("SELECT DISTINCT id FROM data").unwrap();
        session
            .save_query_result("ids", "SELECT DISTINCT id FROM data", result)
            .unwrap();
        assert_eq!(session.active_name(), Some("ids"));
        assert_eq!(session.transaction_log().len(), 1);
    }
}
