//! Dimensional modelling of flat order records into a star schema.
//!
//! The build runs in two phases. The calendar dimension and the five
//! natural-key dimensions are derived independently from the raw dataset;
//! only once all six exist is the fact table resolved against them.
//!
//! ```no_run
//! use ecommerce_warehouse::model::{TableName, build_star_schema};
//! use ecommerce_warehouse::source::load_source;
//! use std::path::Path;
//!
//! let raw = load_source(Path::new("data/MundoEcommerce.parquet"))?;
//! let schema = build_star_schema(&raw)?;
//! assert_eq!(schema.table(TableName::FactSales).height(), raw.height());
//! # Ok::<(), ecommerce_warehouse::error::WarehouseError>(())
//! ```

pub mod columns;
pub mod dates;
pub mod dimension;
pub mod fact;

#[cfg(test)]
mod tests;

pub use dates::{DateLookup, build_date_dimension, date_key, parse_date_str, parse_dates};
pub use dimension::{DimensionSpec, KeyLookup, NATURAL_DIMENSIONS, build_dimension};
pub use fact::build_fact_table;

use crate::error::{Result, WarehouseError};
use columns::{ORDER_DATE, SHIPPING_DATE};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw columns feeding the calendar dimension.
pub const DATE_COLUMNS: [&str; 2] = [ORDER_DATE, SHIPPING_DATE];

/// Names of the seven warehouse tables, in persistence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    DimDate,
    DimCustomer,
    DimProduct,
    DimGeography,
    DimShipMode,
    DimOrderPriority,
    FactSales,
}

impl TableName {
    pub const ALL: [Self; 7] = [
        Self::DimDate,
        Self::DimCustomer,
        Self::DimProduct,
        Self::DimGeography,
        Self::DimShipMode,
        Self::DimOrderPriority,
        Self::FactSales,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DimDate => "dim_date",
            Self::DimCustomer => "dim_customer",
            Self::DimProduct => "dim_product",
            Self::DimGeography => "dim_geography",
            Self::DimShipMode => "dim_ship_mode",
            Self::DimOrderPriority => "dim_order_priority",
            Self::FactSales => "fact_sales",
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TableName {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| WarehouseError::Other(format!("Unknown warehouse table: {s}")))
    }
}

/// The six dimension tables of one build.
#[derive(Debug, Clone)]
pub struct DimensionTables {
    pub date: DataFrame,
    pub customer: DataFrame,
    pub product: DataFrame,
    pub geography: DataFrame,
    pub ship_mode: DataFrame,
    pub order_priority: DataFrame,
}

impl DimensionTables {
    /// Natural-key dimensions paired with their spec, in foreign key order.
    pub fn natural(&self) -> [(&'static DimensionSpec, &DataFrame); 5] {
        [
            (&dimension::CUSTOMER, &self.customer),
            (&dimension::PRODUCT_DIM, &self.product),
            (&dimension::GEOGRAPHY, &self.geography),
            (&dimension::SHIP_MODE_DIM, &self.ship_mode),
            (&dimension::ORDER_PRIORITY_DIM, &self.order_priority),
        ]
    }
}

/// Derives the calendar dimension and all natural-key dimensions from `raw`.
pub fn build_dimensions(raw: &DataFrame) -> Result<DimensionTables> {
    Ok(DimensionTables {
        date: build_date_dimension(raw, &DATE_COLUMNS)?,
        customer: build_dimension(raw, &dimension::CUSTOMER)?,
        product: build_dimension(raw, &dimension::PRODUCT_DIM)?,
        geography: build_dimension(raw, &dimension::GEOGRAPHY)?,
        ship_mode: build_dimension(raw, &dimension::SHIP_MODE_DIM)?,
        order_priority: build_dimension(raw, &dimension::ORDER_PRIORITY_DIM)?,
    })
}

/// Row and column counts of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub name: TableName,
    pub rows: usize,
    pub columns: usize,
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.rows, self.columns)
    }
}

/// A complete named table set: six dimensions plus the fact table.
#[derive(Debug, Clone)]
pub struct StarSchema {
    pub dimensions: DimensionTables,
    pub fact_sales: DataFrame,
}

impl StarSchema {
    pub fn table(&self, name: TableName) -> &DataFrame {
        match name {
            TableName::DimDate => &self.dimensions.date,
            TableName::DimCustomer => &self.dimensions.customer,
            TableName::DimProduct => &self.dimensions.product,
            TableName::DimGeography => &self.dimensions.geography,
            TableName::DimShipMode => &self.dimensions.ship_mode,
            TableName::DimOrderPriority => &self.dimensions.order_priority,
            TableName::FactSales => &self.fact_sales,
        }
    }

    /// All seven tables in persistence order.
    pub fn tables(&self) -> impl Iterator<Item = (TableName, &DataFrame)> {
        TableName::ALL.into_iter().map(|name| (name, self.table(name)))
    }

    pub fn summary(&self) -> Vec<TableSummary> {
        self.tables()
            .map(|(name, df)| TableSummary {
                name,
                rows: df.height(),
                columns: df.width(),
            })
            .collect()
    }

    /// True when every table matches `other` in shape, names, dtypes and values.
    pub fn equals(&self, other: &Self) -> bool {
        self.tables()
            .zip(other.tables())
            .all(|((_, a), (_, b))| a.equals_missing(b))
    }
}

/// Builds the complete star schema from a raw dataset.
///
/// Pure: reads `raw` and returns fresh tables without touching disk.
pub fn build_star_schema(raw: &DataFrame) -> Result<StarSchema> {
    let start = std::time::Instant::now();

    let dimensions = build_dimensions(raw)?;
    let fact_sales = build_fact_table(raw, &dimensions)?;
    let schema = StarSchema {
        dimensions,
        fact_sales,
    };

    tracing::info!(
        "Built star schema from {} source rows in {:.2}s",
        raw.height(),
        start.elapsed().as_secs_f64()
    );
    for summary in schema.summary() {
        tracing::debug!("{summary}");
    }
    Ok(schema)
}
