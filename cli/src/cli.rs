//! Command-line interface for goldpan

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "goldpan")]
#[command(about = "An interactive data-preparation tool for tabular datasets")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a settings TOML file
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile a dataset's quality (completeness, uniqueness, health score)
    Profile {
        /// Input file path (CSV, JSON, Parquet, or XLSX)
        input: String,

        /// Excel sheet name to load
        #[arg(long)]
        sheet: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a SQL query against a dataset (visible as `df`)
    Query {
        /// Input file path
        input: String,

        /// SQL query to execute
        #[arg(long)]
        sql: String,

        /// Limit number of result rows
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a cleaning pipeline and export the result
    Clean {
        /// Input file path
        input: String,

        /// Transform operations, applied in order. One of:
        /// dedup | fill:<col>:<strategy> | trim[:<cols>] |
        /// rename:<old>=<new>[,..] | cast:<col>:<type>
        #[arg(long = "op", required = true)]
        ops: Vec<String>,

        /// Output file path; format is inferred from the extension
        #[arg(long)]
        output: PathBuf,

        /// Also export the transaction log as CSV to this path
        #[arg(long)]
        log: Option<PathBuf>,
    },

    /// Convert a dataset between formats
    Convert {
        /// Input file path
        input: String,

        /// Output file path; format is inferred from the extension
        output: PathBuf,

        /// Outer compression (none, gzip, zip, bz2, xz)
        #[arg(long)]
        compression: Option<String>,
    },
}
