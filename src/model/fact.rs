//! Fact table assembly: one row per raw record, foreign keys resolved by hash lookup.

use super::DimensionTables;
use super::columns::{
    MEASURES, ORDER_DATE, ORDER_DATE_KEY, ORDER_ID, ORDER_ID_KEY, SHIP_DATE_KEY, SHIPPING_DATE,
};
use super::dates::DateLookup;
use super::dimension::KeyLookup;
use crate::error::Result;
use polars::prelude::*;

fn renamed(column: &Column, name: &str) -> Column {
    let mut series = column.as_materialized_series().clone();
    series.rename(name.into());
    Column::from(series)
}

fn order_id_column(raw: &DataFrame) -> Column {
    match raw.column(ORDER_ID) {
        Ok(column) => renamed(column, ORDER_ID_KEY),
        Err(_) => Column::from(Series::full_null(
            ORDER_ID_KEY.into(),
            raw.height(),
            &DataType::String,
        )),
    }
}

/// Builds `fact_sales` from the raw dataset and the completed dimensions.
///
/// Never filters: the output always has `raw.height()` rows. A foreign key is
/// null whenever its date or natural-key tuple has no match, including when
/// the dimension has no driving columns at all.
pub fn build_fact_table(raw: &DataFrame, dims: &DimensionTables) -> Result<DataFrame> {
    let mut columns = Vec::with_capacity(8 + MEASURES.len());
    columns.push(order_id_column(raw));

    let dates = DateLookup::from_dimension(&dims.date)?;
    for (source, target) in [(ORDER_DATE, ORDER_DATE_KEY), (SHIPPING_DATE, SHIP_DATE_KEY)] {
        let resolved = dates.resolve(raw, source)?;
        columns.push(Column::from(Series::new(target.into(), resolved)));
    }

    for (spec, table) in dims.natural() {
        let lookup = KeyLookup::from_dimension(spec, table)?;
        let resolved = lookup.resolve(raw)?;
        let unmatched = resolved.iter().filter(|key| key.is_none()).count();
        if unmatched > 0 {
            tracing::debug!(
                "{} of {} rows have no {} match",
                unmatched,
                resolved.len(),
                spec.key_column
            );
        }
        columns.push(Column::from(Series::new(spec.key_column.into(), resolved)));
    }

    for (source, target) in MEASURES {
        if let Ok(column) = raw.column(source) {
            columns.push(renamed(column, target));
        }
    }

    let fact = DataFrame::new(columns)?;
    tracing::debug!(
        "Built fact_sales with {} rows and {} columns",
        fact.height(),
        fact.width()
    );
    Ok(fact)
}
