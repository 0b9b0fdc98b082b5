//! On-disk warehouse: one Parquet file per table, with build-if-missing caching.
//!
//! # Consistency
//!
//! A save is a sequence of independent file writes with no commit step. If
//! the process dies between two writes, the directory holds a mix of old and
//! new tables that do not reference each other consistently. A later load
//! cannot detect this as long as all seven files exist. Concurrent writers,
//! or a reader racing a rebuild, are equally unprotected.
//!
//! Completeness is checked as a whole: if any one of the seven files is
//! missing, a rebuilding load regenerates and rewrites all seven, even the
//! ones still present.

use crate::error::{Result, ResultExt as _, WarehouseError};
use crate::model::{DimensionTables, StarSchema, TableName, TableSummary, build_star_schema};
use crate::source::load_source;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File extension of every table file.
pub const TABLE_EXTENSION: &str = "parquet";

/// Table file layout under a warehouse directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseDir {
    root: PathBuf,
}

impl WarehouseDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn table_path(&self, name: TableName) -> PathBuf {
        self.root.join(format!("{name}.{TABLE_EXTENSION}"))
    }

    /// Tables whose file is absent, in persistence order.
    pub fn missing_tables(&self) -> Vec<TableName> {
        TableName::ALL
            .into_iter()
            .filter(|name| !self.table_path(*name).is_file())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_tables().is_empty()
    }

    fn write_table(&self, name: TableName, df: &DataFrame) -> Result<PathBuf> {
        let path = self.table_path(name);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut df = df.clone();
        ParquetWriter::new(file)
            .finish(&mut df)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!("Wrote {} ({} rows)", path.display(), df.height());
        Ok(path)
    }

    fn read_table(&self, name: TableName) -> Result<DataFrame> {
        let path = self.table_path(name);
        let file =
            File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        ParquetReader::new(file)
            .finish()
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Reads all seven tables. Fails if any file is missing or unreadable.
    pub fn read_all(&self) -> Result<StarSchema> {
        let missing = self.missing_tables();
        if !missing.is_empty() {
            return Err(self.missing_error(&missing));
        }

        Ok(StarSchema {
            dimensions: DimensionTables {
                date: self.read_table(TableName::DimDate)?,
                customer: self.read_table(TableName::DimCustomer)?,
                product: self.read_table(TableName::DimProduct)?,
                geography: self.read_table(TableName::DimGeography)?,
                ship_mode: self.read_table(TableName::DimShipMode)?,
                order_priority: self.read_table(TableName::DimOrderPriority)?,
            },
            fact_sales: self.read_table(TableName::FactSales)?,
        })
    }

    fn missing_error(&self, missing: &[TableName]) -> WarehouseError {
        WarehouseError::MissingWarehouseFiles {
            dir: self.root.clone(),
            missing: missing
                .iter()
                .map(|name| format!("{name}.{TABLE_EXTENSION}"))
                .collect(),
        }
    }
}

/// Writes every table of `schema` into `dir`, creating it if needed.
///
/// Each file is written independently; see the module docs for what that
/// means on failure.
pub fn save_star_schema(schema: &StarSchema, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create warehouse directory {}", dir.display()))?;

    let layout = WarehouseDir::new(dir);
    for (name, df) in schema.tables() {
        layout.write_table(name, df)?;
    }

    tracing::info!("Saved star schema to {}", dir.display());
    Ok(())
}

/// Outcome of a build or a cached load.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Whether the tables were regenerated from the source.
    pub rebuilt: bool,
    /// Source rows read for the build, if one happened.
    pub source_rows: Option<usize>,
    pub tables: Vec<TableSummary>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn summary(&self) -> String {
        let origin = match (self.rebuilt, self.source_rows) {
            (true, Some(rows)) => format!("built from {rows} source rows"),
            _ => "loaded from cache".to_owned(),
        };
        let fact_rows = self
            .tables
            .iter()
            .find(|t| t.name == TableName::FactSales)
            .map_or(0, |t| t.rows);
        format!(
            "Star schema {origin}: {} tables, {fact_rows} fact rows, {:.2}s",
            self.tables.len(),
            self.duration.as_secs_f64()
        )
    }
}

/// Loads `source`, builds every table and writes them all to `dir`.
pub fn build_warehouse(dir: &Path, source: &Path) -> Result<(StarSchema, BuildReport)> {
    let start = std::time::Instant::now();
    let raw = load_source(source)?;
    let schema = build_star_schema(&raw)?;
    save_star_schema(&schema, dir)?;

    let report = BuildReport {
        rebuilt: true,
        source_rows: Some(raw.height()),
        tables: schema.summary(),
        duration: start.elapsed(),
    };
    tracing::info!("{}", report.summary());
    Ok((schema, report))
}

/// Loads the warehouse in `dir`, rebuilding it from `source` when incomplete.
///
/// With `build_if_missing` false an incomplete directory is an error
/// ([`WarehouseError::MissingWarehouseFiles`]). Otherwise the whole schema is
/// rebuilt through [`build_warehouse`] and the tables are read back from disk
/// so both paths return what is actually persisted.
pub fn load_star_schema(dir: &Path, source: &Path, build_if_missing: bool) -> Result<StarSchema> {
    load_star_schema_with_report(dir, source, build_if_missing).map(|(schema, _)| schema)
}

/// [`load_star_schema`], also reporting whether a rebuild happened.
pub fn load_star_schema_with_report(
    dir: &Path,
    source: &Path,
    build_if_missing: bool,
) -> Result<(StarSchema, BuildReport)> {
    let start = std::time::Instant::now();
    let layout = WarehouseDir::new(dir);
    let missing = layout.missing_tables();

    let mut source_rows = None;
    if !missing.is_empty() {
        if !build_if_missing {
            return Err(layout.missing_error(&missing));
        }

        tracing::warn!(
            "Warehouse at {} is incomplete (missing {}), rebuilding all tables from {}",
            dir.display(),
            missing
                .iter()
                .map(|name| name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            source.display()
        );
        let (_, build) = build_warehouse(dir, source)?;
        source_rows = build.source_rows;
    }

    let schema = layout.read_all()?;
    let report = BuildReport {
        rebuilt: source_rows.is_some(),
        source_rows,
        tables: schema.summary(),
        duration: start.elapsed(),
    };
    if !report.rebuilt {
        tracing::info!("{}", report.summary());
    }
    Ok((schema, report))
}
