//! Command implementations for goldpan CLI

use crate::cli::Commands;
use crate::output;
use anyhow::{bail, Context, Result};
use goldpan_core::export::Compression;
use goldpan_core::ingest::IngestOptions;
use goldpan_core::session::{Session, Settings};
use goldpan_core::table::DataType;
use goldpan_core::transform::{FillStrategy, TransformOp};
use indexmap::IndexMap;
use std::path::Path;

/// Name the ingested dataset is registered under
const DATASET_NAME: &str = "data";

/// Execute a command
pub fn execute_command(command: Commands, settings_path: Option<&Path>) -> Result<()> {
    let settings = match settings_path {
        Some(path) => Settings::load(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    match command {
        Commands::Profile { input, sheet, json } => {
            profile_command(settings, &input, sheet, json)
        }
        Commands::Query {
            input,
            sql,
            limit,
            json,
        } => query_command(settings, &input, &sql, limit, json),
        Commands::Clean {
            input,
            ops,
            output,
            log,
        } => clean_command(settings, &input, &ops, &output, log.as_deref()),
        Commands::Convert {
            input,
            output,
            compression,
        } => convert_command(settings, &input, &output, compression.as_deref()),
    }
}

fn ingest(session: &mut Session, input: &str, sheet: Option<String>) -> Result<()> {
    let options = IngestOptions {
        format: None,
        sheet,
    };
    session
        .ingest_file(Path::new(input), DATASET_NAME, &options)
        .with_context(|| format!("failed to load '{input}'"))?;
    Ok(())
}

fn profile_command(settings: Settings, input: &str, sheet: Option<String>, json: bool) -> Result<()> {
    let mut session = Session::new(settings);
    ingest(&mut session, input, sheet)?;
    let report = session.profile_dataset(DATASET_NAME)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        output::print_profile_report(input, &report);
    }
    Ok(())
}

fn query_command(
    settings: Settings,
    input: &str,
    sql: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let mut session = Session::new(settings);
    ingest(&mut session, input, None)?;

    let mut final_sql = sql.to_string();
    if let Some(limit_value) = limit {
        final_sql = format!("{final_sql} LIMIT {limit_value}");
    }
    let result = session.execute_query(&final_sql)?;

    if json {
        output::print_json_result(&result)?;
    } else {
        output::print_table_result(&result);
    }
    Ok(())
}

fn clean_command(
    settings: Settings,
    input: &str,
    op_specs: &[String],
    output: &Path,
    log: Option<&Path>,
) -> Result<()> {
    let ops = op_specs
        .iter()
        .map(|spec| parse_op(spec))
        .collect::<Result<Vec<_>>>()?;

    let mut session = Session::new(settings);
    ingest(&mut session, input, None)?;
    session.apply_pipeline(DATASET_NAME, &ops)?;
    session.export_dataset(DATASET_NAME, output, None)?;
    println!("✅ Wrote cleaned dataset to {}", output.display());

    if let Some(log_path) = log {
        session.export_log(log_path)?;
        println!("✅ Wrote transaction log to {}", log_path.display());
    }
    Ok(())
}

fn convert_command(
    settings: Settings,
    input: &str,
    output: &Path,
    compression: Option<&str>,
) -> Result<()> {
    let compression = compression.map(Compression::parse).transpose()?;

    let mut session = Session::new(settings);
    ingest(&mut session, input, None)?;
    session.export_dataset(DATASET_NAME, output, compression)?;
    println!("✅ Wrote {}", output.display());
    Ok(())
}

/// Parse one `--op` specification into a transform
fn parse_op(spec: &str) -> Result<TransformOp> {
    let mut parts = spec.splitn(3, ':');
    let kind = parts.next().unwrap_or("");
    match kind {
        "dedup" => Ok(TransformOp::Dedup),
        "fill" => {
            let (column, strategy) = match (parts.next(), parts.next()) {
                (Some(column), Some(strategy)) if !column.is_empty() => (column, strategy),
                _ => bail!("fill requires a column and strategy: fill:<col>:<strategy>"),
            };
            Ok(TransformOp::FillMissing {
                column: column.to_string(),
                strategy: FillStrategy::parse(strategy)?,
            })
        }
        "trim" => {
            let columns = parts.next().map(|list| {
                list.split(',')
                    .map(|c| c.trim().to_string())
                    .collect::<Vec<_>>()
            });
            Ok(TransformOp::TrimWhitespace { columns })
        }
        "rename" => {
            let list = parts
                .next()
                .filter(|l| !l.is_empty())
                .context("rename requires mappings: rename:<old>=<new>[,..]")?;
            let mut mapping = IndexMap::new();
            for pair in list.split(',') {
                let (old, new) = pair
                    .split_once('=')
                    .with_context(|| format!("invalid rename pair '{pair}'"))?;
                mapping.insert(old.trim().to_string(), new.trim().to_string());
            }
            Ok(TransformOp::RenameColumns { mapping })
        }
        "cast" => {
            let (column, target) = match (parts.next(), parts.next()) {
                (Some(column), Some(target)) if !column.is_empty() => (column, target),
                _ => bail!("cast requires a column and type: cast:<col>:<type>"),
            };
            Ok(TransformOp::CastColumn {
                column: column.to_string(),
                target: DataType::parse(target)?,
            })
        }
        other => bail!("unknown operation '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dedup() {
        assert!(matches!(parse_op("dedup").unwrap(), TransformOp::Dedup));
    }

    #[test]
    fn test_parse_fill() {
        let op = parse_op("fill:age:median").unwrap();
        match op {
            TransformOp::FillMissing { column, strategy } => {
                assert_eq!(column, "age");
                assert_eq!(strategy, FillStrategy::Median);
            }
            _ => panic!("expected fill"),
        }
        assert!(parse_op("fill:age").is_err());
    }

    #[test]
    fn test_parse_trim() {
        match parse_op("trim").unwrap() {
            TransformOp::TrimWhitespace { columns } => assert!(columns.is_none()),
            _ => panic!("expected trim"),
        }
        match parse_op("trim:name,city").unwrap() {
            TransformOp::TrimWhitespace { columns } => {
                assert_eq!(columns.unwrap(), vec!["name", "city"]);
            }
            _ => panic!("expected trim"),
        }
    }

    #[test]
    fn test_parse_rename() {
        match parse_op("rename:a=b,c=d").unwrap() {
            TransformOp::RenameColumns { mapping } => {
                assert_eq!(mapping.get("a").map(String::as_str), Some("b"));
                assert_eq!(mapping.get("c").map(String::as_str), Some("d"));
            }
            _ => panic!("expected rename"),
        }
        assert!(parse_op("rename:ab").is_err());
    }

    #[test]
    fn test_parse_cast() {
        match parse_op("cast:age:integer").unwrap() {
            TransformOp::CastColumn { column, target } => {
                assert_eq!(column, "age");
                assert_eq!(target, DataType::Integer);
            }
            _ => panic!("expected cast"),
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert!(parse_op("explode").is_err());
    }
}
