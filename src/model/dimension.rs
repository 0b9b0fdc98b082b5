//! Natural-key dimensions: one generic builder driven by a declarative spec.

use super::TableName;
use super::columns::{
    CITY, COUNTRY, CUSTOMER_ID, CUSTOMER_NAME, ORDER_PRIORITY, PRODUCT, PRODUCT_CATEGORY, REGION,
    SEGMENT, SHIP_MODE, STATE,
};
use crate::error::Result;
use polars::prelude::*;
use std::collections::HashMap;

/// Configuration of one natural-key dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSpec {
    pub table: TableName,
    /// Surrogate key column, also the foreign key name in the fact table.
    pub key_column: &'static str,
    /// Natural-key columns in sort priority order. Any subset may be present.
    pub candidates: &'static [&'static str],
}

pub const CUSTOMER: DimensionSpec = DimensionSpec {
    table: TableName::DimCustomer,
    key_column: "CustomerKey",
    candidates: &[CUSTOMER_ID, CUSTOMER_NAME, SEGMENT],
};

pub const PRODUCT_DIM: DimensionSpec = DimensionSpec {
    table: TableName::DimProduct,
    key_column: "ProductKey",
    candidates: &[PRODUCT_CATEGORY, PRODUCT],
};

pub const GEOGRAPHY: DimensionSpec = DimensionSpec {
    table: TableName::DimGeography,
    key_column: "GeoKey",
    candidates: &[COUNTRY, REGION, STATE, CITY],
};

pub const SHIP_MODE_DIM: DimensionSpec = DimensionSpec {
    table: TableName::DimShipMode,
    key_column: "ShipModeKey",
    candidates: &[SHIP_MODE],
};

pub const ORDER_PRIORITY_DIM: DimensionSpec = DimensionSpec {
    table: TableName::DimOrderPriority,
    key_column: "OrderPriorityKey",
    candidates: &[ORDER_PRIORITY],
};

/// The five natural-key dimensions, in fact-table foreign key order.
pub const NATURAL_DIMENSIONS: [DimensionSpec; 5] = [
    CUSTOMER,
    PRODUCT_DIM,
    GEOGRAPHY,
    SHIP_MODE_DIM,
    ORDER_PRIORITY_DIM,
];

impl DimensionSpec {
    /// Candidate columns that exist in `df`, in candidate order.
    pub fn present_columns(&self, df: &DataFrame) -> Vec<&'static str> {
        self.candidates
            .iter()
            .copied()
            .filter(|name| df.column(name).is_ok())
            .collect()
    }

    /// A zero-row table holding only the surrogate key column.
    pub fn placeholder(&self) -> Result<DataFrame> {
        let key = Series::new(self.key_column.into(), Vec::<IdxSize>::new());
        Ok(DataFrame::new(vec![Column::from(key)])?)
    }
}

/// Deduplicates the natural-key columns of `raw` and assigns dense surrogate keys.
///
/// Rows are sorted ascending over the present candidate columns (nulls last)
/// and numbered from 1 in that order. Missing candidates narrow the table;
/// with none present the result is [`DimensionSpec::placeholder`].
pub fn build_dimension(raw: &DataFrame, spec: &DimensionSpec) -> Result<DataFrame> {
    let columns = spec.present_columns(raw);
    if columns.is_empty() {
        tracing::warn!(
            "No natural-key columns for {} (expected any of {:?}), emitting key-only table",
            spec.table,
            spec.candidates
        );
        return spec.placeholder();
    }

    let by: Vec<Expr> = columns.iter().map(|name| col(*name)).collect();
    let dim = raw
        .clone()
        .lazy()
        .select(by.clone())
        .unique_stable(None, UniqueKeepStrategy::First)
        .sort_by_exprs(
            by,
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .with_row_index(spec.key_column, Some(1))
        .collect()?;

    tracing::debug!(
        "Built {} with {} rows over {:?}",
        spec.table,
        dim.height(),
        columns
    );
    Ok(dim)
}

/// Natural-key tuple as text; `None` entries are nulls.
pub type NaturalKey = Vec<Option<String>>;

fn text_values(column: &Column) -> Result<Vec<Option<String>>> {
    let text = column.as_materialized_series().cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_owned))
        .collect())
}

/// Row-wise natural-key tuples of `df` projected onto `columns`.
fn natural_keys(df: &DataFrame, columns: &[&str]) -> Result<Vec<NaturalKey>> {
    let mut keys: Vec<NaturalKey> = vec![Vec::with_capacity(columns.len()); df.height()];
    for name in columns {
        for (key, value) in keys.iter_mut().zip(text_values(df.column(name)?)?) {
            key.push(value);
        }
    }
    Ok(keys)
}

/// Map from natural-key tuple to surrogate key, built once per dimension table.
#[derive(Debug, Clone)]
pub struct KeyLookup {
    columns: Vec<&'static str>,
    keys: HashMap<NaturalKey, u32>,
}

impl KeyLookup {
    /// Indexes `dim`. Works on freshly built tables and on reloaded ones.
    pub fn from_dimension(spec: &DimensionSpec, dim: &DataFrame) -> Result<Self> {
        let columns = spec.present_columns(dim);
        let mut keys = HashMap::new();

        if !columns.is_empty()
            && let Ok(key_col) = dim.column(spec.key_column)
        {
            let surrogate = key_col.as_materialized_series().cast(&DataType::UInt32)?;
            for (natural, key) in natural_keys(dim, &columns)?.into_iter().zip(surrogate.u32()?) {
                if let Some(key) = key {
                    keys.entry(natural).or_insert(key);
                }
            }
        }

        Ok(Self { columns, keys })
    }

    /// Natural-key columns this dimension actually carries.
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, natural: &[Option<String>]) -> Option<u32> {
        self.keys.get(natural).copied()
    }

    /// Resolves the surrogate key of every row of `raw`.
    ///
    /// Rows without a match get `None`, as do all rows when the dimension has
    /// no driving columns or `raw` lacks one of them.
    pub fn resolve(&self, raw: &DataFrame) -> Result<Vec<Option<u32>>> {
        let all_present = self.columns.iter().all(|name| raw.column(name).is_ok());
        if self.columns.is_empty() || !all_present {
            return Ok(vec![None; raw.height()]);
        }

        Ok(natural_keys(raw, &self.columns)?
            .iter()
            .map(|natural| self.get(natural))
            .collect())
    }
}
