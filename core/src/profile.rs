//! Quality profiler: per-column statistics and the composite health score

use crate::error::{GoldpanError, Result};
use crate::table::{DataType, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Weights for the health-score formula:
/// `health = round(100 * (w_completeness * completeness + w_uniqueness * uniqueness))`
///
/// Kept configurable rather than hard-coded; the default is equal weighting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthWeights {
    pub completeness: f64,
    pub uniqueness: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        Self {
            completeness: 0.5,
            uniqueness: 0.5,
        }
    }
}

/// Statistics for one column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub data_type: DataType,
    pub non_null_count: u64,
    pub null_count: u64,
    pub unique_values: u64,
    /// First three distinct non-null values, rendered, in row order
    pub sample_values: Vec<String>,
}

/// Derived, non-persisted quality report over a table snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub row_count: u64,
    pub column_count: u64,
    pub total_cells: u64,
    pub missing_cells: u64,
    pub duplicate_rows: u64,
    /// `1 - missing_cells / total_cells`; 1.0 for a zero-row table
    pub completeness: f64,
    /// `1 - duplicate_rows / row_count`; 1.0 for a zero-row table
    pub uniqueness: f64,
    /// Composite score in `[0, 100]`
    pub health: u8,
    pub columns: Vec<ColumnProfile>,
}

/// Compute a quality report. Deterministic and read-only.
///
/// A zero-row table profiles as perfectly complete and unique; a table with
/// zero columns has nothing to profile and fails with `EmptyTableProfile`.
pub fn profile(table: &Table, weights: &HealthWeights) -> Result<ProfileReport> {
    if table.column_count() == 0 {
        return Err(GoldpanError::EmptyTableProfile);
    }

    let row_count = table.row_count() as u64;
    let column_count = table.column_count() as u64;
    let total_cells = row_count * column_count;
    let missing_cells = table.null_cell_count() as u64;
    let duplicate_rows = table.duplicate_row_count() as u64;

    let completeness = if total_cells == 0 {
        1.0
    } else {
        1.0 - missing_cells as f64 / total_cells as f64
    };
    let uniqueness = if row_count == 0 {
        1.0
    } else {
        1.0 - duplicate_rows as f64 / row_count as f64
    };

    let score = 100.0 * (weights.completeness * completeness + weights.uniqueness * uniqueness);
    let health = score.round().clamp(0.0, 100.0) as u8;

    let columns = table
        .columns
        .iter()
        .enumerate()
        .map(|(index, col)| {
            let mut null_count = 0u64;
            let mut distinct = HashSet::new();
            let mut samples = Vec::new();
            for row in &table.rows {
                let value = &row[index];
                if value.is_null() {
                    null_count += 1;
                    continue;
                }
                let rendered = value.render();
                if distinct.insert(rendered.clone()) && samples.len() < 3 {
                    samples.push(rendered);
                }
            }
            ColumnProfile {
                name: col.name.clone(),
                data_type: col.data_type,
                non_null_count: row_count - null_count,
                null_count,
                unique_values: distinct.len() as u64,
                sample_values: samples,
            }
        })
        .collect();

    Ok(ProfileReport {
        row_count,
        column_count,
        total_cells,
        missing_cells,
        duplicate_rows,
        completeness,
        uniqueness,
        health,
        columns,
    })
}
