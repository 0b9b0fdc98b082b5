//! Excel workbooks as raw sources.
//!
//! The first worksheet is read; its first row is the header. Each column gets
//! one dtype from the cells it holds: all integers become `Int64`, any mix of
//! numbers `Float64`, booleans `Boolean`, date cells `Datetime(ms)`, and
//! anything else falls back to text. Empty and error cells are null.

use crate::error::{Result, WarehouseError};
use calamine::{Data, Range, Reader as _, open_workbook_auto};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::HashSet;
use std::path::Path;

/// Extensions dispatched to [`read_excel`].
pub const EXCEL_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xlsb", "xls"];

/// Reads the first worksheet of the workbook at `path` into a frame.
pub fn read_excel(path: &Path) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path).map_err(|e| excel_error(path, e))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(excel_error(path, "workbook has no worksheets"));
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| excel_error(path, e))?;

    tracing::debug!("Reading worksheet '{sheet}' of {}", path.display());
    range_to_frame(&range)
}

fn excel_error(path: &Path, err: impl std::fmt::Display) -> WarehouseError {
    WarehouseError::SourceRead(format!("{}: {err}", path.display()))
}

/// Converts a cell range with a header row into a frame.
pub fn range_to_frame(range: &Range<Data>) -> Result<DataFrame> {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataFrame::empty());
    };
    let names = header_names(header);
    let body: Vec<&[Data]> = rows.filter(|row| !row.iter().all(is_blank)).collect();

    let columns = names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                .collect();
            cells_to_column(name, &cells)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DataFrame::new(columns)?)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Trimmed header texts; blanks become `Unnamed: <n>` and repeats get a `.<n>` suffix.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen = HashSet::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell.to_string().trim() {
                "" => format!("Unnamed: {idx}"),
                text => text.to_owned(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{base}.{n}");
                n += 1;
            }
            name
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Empty,
    Int,
    Float,
    Bool,
    DateTime,
    Text,
}

impl CellKind {
    fn of(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => Self::Empty,
            Data::Int(_) => Self::Int,
            Data::Float(_) => Self::Float,
            Data::Bool(_) => Self::Bool,
            Data::DateTime(_) | Data::DateTimeIso(_) => Self::DateTime,
            Data::String(_) | Data::DurationIso(_) => Self::Text,
        }
    }

    fn merge(self, other: Self) -> Self {
        match (self, other) {
            (a, b) if a == b => a,
            (Self::Empty, k) | (k, Self::Empty) => k,
            (Self::Int | Self::Float, Self::Int | Self::Float) => Self::Float,
            _ => Self::Text,
        }
    }
}

fn cell_datetime(cell: &Data) -> Option<NaiveDateTime> {
    match cell {
        Data::DateTime(dt) => dt.as_datetime(),
        Data::DateTimeIso(text) => NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            }),
        _ => None,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match CellKind::of(cell) {
        CellKind::Empty => None,
        _ => Some(cell.to_string()),
    }
}

fn cells_to_column(name: &str, cells: &[&Data]) -> Result<Column> {
    let kind = cells
        .iter()
        .fold(CellKind::Empty, |acc, cell| acc.merge(CellKind::of(cell)));

    let series = match kind {
        CellKind::Int => {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::Float => {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Int(v) => Some(*v as f64),
                    Data::Float(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::Bool => {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|cell| match cell {
                    Data::Bool(v) => Some(*v),
                    _ => None,
                })
                .collect();
            Series::new(name.into(), values)
        }
        CellKind::DateTime => {
            let millis: Vec<Option<i64>> = cells
                .iter()
                .map(|cell| cell_datetime(cell).map(|dt| dt.and_utc().timestamp_millis()))
                .collect();
            Series::new(name.into(), millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        }
        CellKind::Empty | CellKind::Text => {
            let values: Vec<Option<String>> = cells.iter().map(|cell| cell_text(cell)).collect();
            Series::new(name.into(), values)
        }
    };
    Ok(Column::from(series))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(rows: &[Vec<Data>]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn text(s: &str) -> Data {
        Data::String(s.to_owned())
    }

    #[test]
    fn test_column_dtypes_from_cells() -> Result<()> {
        let df = range_to_frame(&range(&[
            vec![text("Order ID"), text("Quantity"), text("Sales"), text("Returned")],
            vec![text("O1"), Data::Int(2), Data::Int(10), Data::Bool(true)],
            vec![text("O2"), Data::Int(5), Data::Float(2.5), Data::Empty],
        ]))?;

        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.column("Order ID")?.dtype(), &DataType::String);
        assert_eq!(df.column("Quantity")?.dtype(), &DataType::Int64);
        assert_eq!(df.column("Sales")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("Returned")?.dtype(), &DataType::Boolean);
        assert_eq!(df.column("Returned")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_mixed_cells_fall_back_to_text() -> Result<()> {
        let df = range_to_frame(&range(&[
            vec![text("Order Date")],
            vec![text("N/A")],
            vec![Data::Int(7)],
        ]))?;

        let values: Vec<Option<String>> = df
            .column("Order Date")?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_owned))
            .collect();
        assert_eq!(values, vec![Some("N/A".to_owned()), Some("7".to_owned())]);
        Ok(())
    }

    #[test]
    fn test_iso_datetime_cells() -> Result<()> {
        let df = range_to_frame(&range(&[
            vec![text("Order Date")],
            vec![Data::DateTimeIso("2021-01-04T09:30:00".to_owned())],
            vec![Data::Empty],
        ]))?;

        let column = df.column("Order Date")?;
        assert_eq!(
            column.dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        assert_eq!(column.null_count(), 1);
        Ok(())
    }

    #[test]
    fn test_header_names_fill_blanks_and_repeats() {
        let names = header_names(&[text(" Sales "), Data::Empty, text("Sales")]);
        assert_eq!(names, vec!["Sales", "Unnamed: 1", "Sales.1"]);
    }

    #[test]
    fn test_blank_rows_are_skipped() -> Result<()> {
        let df = range_to_frame(&range(&[
            vec![text("Product"), text("Sales")],
            vec![text("Mouse"), Data::Float(1.0)],
            vec![Data::Empty, text("  ")],
            vec![text("Tyre"), Data::Float(2.0)],
        ]))?;
        assert_eq!(df.height(), 2);
        Ok(())
    }
}
