//! Table export via DuckDB's COPY command, with optional stream compression
//!
//! The table is materialized into an in-memory connection, copied to a
//! temporary file in the requested format, and the bytes are returned (or
//! written to a path) after the compression pass. Parquet and Excel carry
//! their own internal encoding and accept no outer compression.

use crate::error::{GoldpanError, Result};
use crate::query;
use crate::table::Table;
use std::io::Write;
use std::path::Path;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Apache Parquet columnar format
    Parquet,
    /// JSON array of record objects
    Json,
    /// Microsoft Excel (XLSX)
    Excel,
}

impl ExportFormat {
    /// DuckDB format string for the COPY command
    pub fn duckdb_format(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Parquet => "PARQUET",
            ExportFormat::Json => "JSON",
            ExportFormat::Excel => "XLSX",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
            ExportFormat::Json => "json",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// Determine format from a file extension
    pub fn from_extension(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        match extension.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("parquet") => Ok(ExportFormat::Parquet),
            Some("json") => Ok(ExportFormat::Json),
            Some("xlsx") => Ok(ExportFormat::Excel),
            Some(ext) => Err(GoldpanError::invalid_input(format!(
                "unsupported file extension: {ext}"
            ))),
            None => Err(GoldpanError::invalid_input("no file extension provided")),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Outer compression applied to the exported byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zip,
    Bz2,
    Xz,
}

impl Compression {
    pub fn parse(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zip" => Ok(Compression::Zip),
            "bz2" | "bzip2" => Ok(Compression::Bz2),
            "xz" => Ok(Compression::Xz),
            other => Err(GoldpanError::invalid_input(format!(
                "unknown compression: '{other}'"
            ))),
        }
    }

    /// File extension appended to the format's own, if any
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Zip => Some("zip"),
            Compression::Bz2 => Some("bz2"),
            Compression::Xz => Some("xz"),
        }
    }

    /// Whether this compression can wrap the given format. Text formats
    /// accept everything; Parquet and Excel only `none`.
    pub fn supported_for(&self, format: ExportFormat) -> bool {
        match format {
            ExportFormat::Csv | ExportFormat::Json => true,
            ExportFormat::Parquet | ExportFormat::Excel => *self == Compression::None,
        }
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zip => "zip",
            Compression::Bz2 => "bz2",
            Compression::Xz => "xz",
        };
        write!(f, "{name}")
    }
}

/// Export options for customizing output
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Whether to include a CSV header row (CSV only)
    pub include_header: bool,
    /// CSV delimiter character (CSV only)
    pub delimiter: char,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_header: true,
            delimiter: ',',
        }
    }
}

/// Determine format and compression from a path like `out.csv.gz`
pub fn detect_from_path(path: &Path) -> Result<(ExportFormat, Compression)> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match Compression::parse(extension) {
        Ok(compression) if extension != "none" => {
            let inner = path.with_extension("");
            Ok((ExportFormat::from_extension(&inner)?, compression))
        }
        _ => Ok((ExportFormat::from_extension(path)?, Compression::None)),
    }
}

/// Serialize a table and return the (possibly compressed) bytes
pub fn export_bytes(
    table: &Table,
    format: ExportFormat,
    compression: Compression,
    options: &ExportOptions,
) -> Result<Vec<u8>> {
    if !compression.supported_for(format) {
        return Err(GoldpanError::UnsupportedCombination {
            format: format.to_string(),
            compression: compression.to_string(),
        });
    }
    if table.column_count() == 0 {
        return Err(GoldpanError::invalid_input(
            "table has no columns to export",
        ));
    }

    let connection = query::open_connection()?;
    query::materialize_table(&connection, "export_data", table)?;

    let staging = tempfile::tempdir()?;
    let output = staging.path().join(format!("export.{}", format.extension()));
    let copy_command = build_copy_command(&output, format, options);
    connection
        .execute(&copy_command, [])
        .map_err(|e| GoldpanError::invalid_input(format!("export failed: {e}")))?;

    let raw = std::fs::read(&output)?;
    log::debug!(
        "exported {} rows as {} ({} bytes before compression)",
        table.row_count(),
        format,
        raw.len()
    );
    compress(raw, format, compression)
}

/// Serialize a table to a file; format and compression come from the path
/// extension(s) unless a compression is given explicitly
pub fn export_to_path(
    table: &Table,
    path: &Path,
    compression: Option<Compression>,
    options: &ExportOptions,
) -> Result<()> {
    let (format, detected) = detect_from_path(path)?;
    let compression = compression.unwrap_or(detected);
    let bytes = export_bytes(table, format, compression, options)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Build the DuckDB COPY command for the format and options
fn build_copy_command(output: &Path, format: ExportFormat, options: &ExportOptions) -> String {
    let path_str = output.to_string_lossy();
    match format {
        ExportFormat::Csv => {
            let header = if options.include_header { "true" } else { "false" };
            format!(
                "COPY (SELECT * FROM export_data) TO '{}' (FORMAT CSV, HEADER {}, DELIMITER '{}')",
                path_str, header, options.delimiter
            )
        }
        ExportFormat::Parquet => format!(
            "COPY (SELECT * FROM export_data) TO '{path_str}' (FORMAT PARQUET)"
        ),
        ExportFormat::Json => format!(
            "COPY (SELECT * FROM export_data) TO '{path_str}' (FORMAT JSON, ARRAY true)"
        ),
        ExportFormat::Excel => format!(
            "COPY (SELECT * FROM export_data) TO '{path_str}' (FORMAT XLSX)"
        ),
    }
}

fn compress(raw: Vec<u8>, format: ExportFormat, compression: Compression) -> Result<Vec<u8>> {
    match compression {
        Compression::None => Ok(raw),
        Compression::Gzip => {
            let mut encoder =
                flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw)?;
            Ok(encoder.finish()?)
        }
        Compression::Zip => {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
            let entry_name = format!("data.{}", format.extension());
            writer
                .start_file(entry_name, zip::write::SimpleFileOptions::default())
                .map_err(|e| GoldpanError::invalid_input(format!("zip compression failed: {e}")))?;
            writer.write_all(&raw)?;
            let cursor = writer
                .finish()
                .map_err(|e| GoldpanError::invalid_input(format!("zip compression failed: {e}")))?;
            Ok(cursor.into_inner())
        }
        Compression::Bz2 => {
            let mut encoder =
                bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
            encoder.write_all(&raw)?;
            Ok(encoder.finish()?)
        }
        Compression::Xz => {
            let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
            encoder.write_all(&raw)?;
            Ok(encoder.finish()?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_export_format_from_extension() {
        assert_eq!(
            ExportFormat::from_extension(&PathBuf::from("test.csv")).unwrap(),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::from_extension(&PathBuf::from("test.parquet")).unwrap(),
            ExportFormat::Parquet
        );
        assert_eq!(
            ExportFormat::from_extension(&PathBuf::from("test.json")).unwrap(),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::from_extension(&PathBuf::from("test.xlsx")).unwrap(),
            ExportFormat::Excel
        );
        assert!(ExportFormat::from_extension(&PathBuf::from("test.txt")).is_err());
    }

    #[test]
    fn test_detect_from_path_with_compression() {
        let (format, compression) = detect_from_path(&PathBuf::from("out.csv.gz")).unwrap();
        assert_eq!(format, ExportFormat::Csv);
        assert_eq!(compression, Compression::Gzip);

        let (format, compression) = detect_from_path(&PathBuf::from("out.json")).unwrap();
        assert_eq!(format, ExportFormat::Json);
        assert_eq!(compression, Compression::None);
    }

    #[test]
    fn test_support_matrix() {
        assert!(Compression::Gzip.supported_for(ExportFormat::Csv));
        assert!(Compression::Xz.supported_for(ExportFormat::Json));
        assert!(Compression::None.supported_for(ExportFormat::Parquet));
        assert!(!Compression::Gzip.supported_for(ExportFormat::Parquet));
        assert!(!Compression::Xz.supported_for(ExportFormat::Excel));
    }

    #[test]
    fn test_duckdb_format() {
        assert_eq!(ExportFormat::Csv.duckdb_format(), "CSV");
        assert_eq!(ExportFormat::Parquet.duckdb_format(), "PARQUET");
        assert_eq!(ExportFormat::Json.duckdb_format(), "JSON");
        assert_eq!(ExportFormat::Excel.duckdb_format(), "XLSX");
    }

    #[test]
    fn test_export_options_default() {
        let options = ExportOptions::default();
        assert!(options.include_header);
        assert_eq!(options.delimiter, ',');
    }
}
