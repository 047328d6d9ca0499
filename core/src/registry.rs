//! Dataset registry: named tables plus the active-dataset pointer

use crate::error::{GoldpanError, Result};
use crate::table::Table;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

/// What `register` does when the name is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverwritePolicy {
    /// Silently replace the existing entry (the default; matches the
    /// original tool's behavior of re-assigning a dataframe name)
    #[default]
    Replace,
    /// Fail with `DuplicateDataset` and leave the registry unchanged
    Reject,
}

/// One registered dataset
#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub table: Table,
    pub created_at: DateTime<Utc>,
}

/// Summary row for the "list datasets" view
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub row_count: usize,
    pub column_count: usize,
    pub created_at: DateTime<Utc>,
    pub active: bool,
}

/// In-memory mapping from dataset name to table. The registry is the sole
/// owner of each table value; readers get references or clones, and writes
/// only happen through `register`/`replace`.
#[derive(Debug, Default)]
pub struct DatasetRegistry {
    datasets: IndexMap<String, DatasetEntry>,
    active: Option<String>,
    policy: OverwritePolicy,
}

impl DatasetRegistry {
    pub fn new(policy: OverwritePolicy) -> Self {
        Self {
            datasets: IndexMap::new(),
            active: None,
            policy,
        }
    }

    /// Insert or replace a dataset. The first dataset ever registered
    /// becomes the active one.
    pub fn register(&mut self, name: impl Into<String>, table: Table) -> Result<()> {
        let name = name.into();
        if self.policy == OverwritePolicy::Reject && self.datasets.contains_key(&name) {
            return Err(GoldpanError::DuplicateDataset { name });
        }
        log::debug!(
            "registering dataset '{name}' ({} rows, {} columns)",
            table.row_count(),
            table.column_count()
        );
        self.datasets.insert(
            name.clone(),
            DatasetEntry {
                table,
                created_at: Utc::now(),
            },
        );
        if self.active.is_none() {
            self.active = Some(name);
        }
        Ok(())
    }

    /// Replace the table of an existing entry, keeping its creation time.
    /// Used by transforms, which never create new names.
    pub(crate) fn replace(&mut self, name: &str, table: Table) -> Result<()> {
        match self.datasets.get_mut(name) {
            Some(entry) => {
                entry.table = table;
                Ok(())
            }
            None => Err(GoldpanError::not_found(name)),
        }
    }

    pub fn get(&self, name: &str) -> Result<&Table> {
        self.datasets
            .get(name)
            .map(|entry| &entry.table)
            .ok_or_else(|| GoldpanError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    pub fn set_active(&mut self, name: &str) -> Result<()> {
        if !self.datasets.contains_key(name) {
            return Err(GoldpanError::not_found(name));
        }
        self.active = Some(name.to_string());
        Ok(())
    }

    /// Name of the active dataset, if any dataset is registered
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The active dataset's table, or `NotFound` when the registry is empty
    pub fn active_table(&self) -> Result<&Table> {
        match &self.active {
            Some(name) => self.get(name),
            None => Err(GoldpanError::not_found("<no active dataset>")),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// All registered tables in insertion order, for the query adapter
    pub fn tables(&self) -> IndexMap<String, &Table> {
        self.datasets
            .iter()
            .map(|(name, entry)| (name.clone(), &entry.table))
            .collect()
    }

    /// Insertion-ordered summaries for presentation
    pub fn list(&self) -> Vec<DatasetSummary> {
        self.datasets
            .iter()
            .map(|(name, entry)| DatasetSummary {
                name: name.clone(),
                row_count: entry.table.row_count(),
                column_count: entry.table.column_count(),
                created_at: entry.created_at,
                active: self.active.as_deref() == Some(name.as_str()),
            })
            .collect()
    }

    /// Remove a dataset. If it was active, the first remaining dataset (in
    /// insertion order) becomes active.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        if self.datasets.shift_remove(name).is_none() {
            return Err(GoldpanError::not_found(name));
        }
        if self.active.as_deref() == Some(name) {
            self.active = self.datasets.keys().next().cloned();
        }
        Ok(())
    }
}
