//! Raw dataset loading and format conversion.
//!
//! Sources may be CSV, Parquet, JSON or an Excel workbook; the order data
//! usually arrives as a workbook and is converted to Parquet once.
//!
//! The loader contract is small: given a path, return the whole table or fail
//! with [`WarehouseError::SourceNotFound`] / [`WarehouseError::SourceRead`].
//! Callers treat both as fatal and never retry.

pub mod excel;

use crate::error::{Result, WarehouseError};
use excel::{EXCEL_EXTENSIONS, read_excel};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn read_failure(path: &Path, err: impl std::fmt::Display) -> WarehouseError {
    WarehouseError::SourceRead(format!("{}: {err}", path.display()))
}

/// Loads the raw order dataset (CSV, Parquet, JSON or Excel, chosen by extension).
pub fn load_source(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(WarehouseError::SourceNotFound(path.to_path_buf()));
    }

    let ext = extension(path);
    let df = match ext.as_str() {
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10_000))
            .with_has_header(true)
            .finish()
            .and_then(LazyFrame::collect)
            .map_err(|e| read_failure(path, e))?,
        "parquet" => {
            let file = File::open(path).map_err(|e| read_failure(path, e))?;
            ParquetReader::new(file)
                .finish()
                .map_err(|e| read_failure(path, e))?
        }
        "json" => {
            let file = File::open(path).map_err(|e| read_failure(path, e))?;
            JsonReader::new(file)
                .finish()
                .map_err(|e| read_failure(path, e))?
        }
        ext if EXCEL_EXTENSIONS.contains(&ext) => read_excel(path)?,
        _ => {
            return Err(read_failure(
                path,
                format!("unsupported file extension '{ext}'"),
            ));
        }
    };

    tracing::info!(
        "Loaded source {} ({} rows, {} columns)",
        path.display(),
        df.height(),
        df.width()
    );
    Ok(df)
}

/// Writes `df` as Parquet, or as CSV when `path` ends in `.csv`.
pub fn save_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    if extension(path) == "csv" {
        CsvWriter::new(file).include_header(true).finish(df)?;
    } else {
        ParquetWriter::new(file).finish(df)?;
    }
    Ok(())
}

/// Reads a source in any supported format and rewrites it at `output`.
///
/// Returns the number of rows written.
pub fn convert_source(input: &Path, output: &Path) -> Result<usize> {
    let mut df = load_source(input)?;
    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    save_table(&mut df, output)?;
    tracing::info!("Converted {} -> {}", input.display(), output.display());
    Ok(df.height())
}
