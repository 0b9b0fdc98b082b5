//! Calendar dimension derived from the raw date-valued columns.

use super::columns::{
    DATE, DATE_KEY, DAY, DAY_OF_WEEK, DAY_OF_WEEK_NAME, MONTH, MONTH_NAME, QUARTER, WEEK_OF_YEAR,
    YEAR,
};
use crate::error::Result;
use chrono::{DateTime, Datelike as _, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the polars `Date` epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Years a calendar date may carry. Anything outside is treated as unparseable.
pub const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Encodes a date as its `YYYYMMDD` integer.
///
/// Dates produced by [`parse_date_str`] and [`parse_dates`] always lie in
/// [`SUPPORTED_YEARS`], where the encoding fits an `i32`.
pub fn date_key(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Parses one textual date value. Returns `None` for anything unrecognised.
pub fn parse_date_str(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        });
    parsed.filter(is_supported)
}

fn is_supported(date: &NaiveDate) -> bool {
    SUPPORTED_YEARS.contains(&date.year())
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
        .filter(is_supported)
}

fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Parses every value of a column into a calendar date, one entry per row.
///
/// Values that are null or cannot be parsed come back as `None`; this never
/// fails on bad data, only on polars errors.
pub fn parse_dates(column: &Column) -> Result<Vec<Option<NaiveDate>>> {
    let series = column.as_materialized_series();

    let days = match series.dtype() {
        DataType::Date => Some(series.cast(&DataType::Int32)?),
        DataType::Datetime(_, _) => Some(series.cast(&DataType::Date)?.cast(&DataType::Int32)?),
        _ => None,
    };

    if let Some(days) = days {
        return Ok(days
            .i32()?
            .into_iter()
            .map(|d| d.and_then(date_from_epoch_days))
            .collect());
    }

    let text = series.cast(&DataType::String)?;
    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_date_str))
        .collect())
}

/// Builds the calendar dimension from whichever of `date_columns` exist in `raw`.
///
/// Dates are the deduplicated union of every parseable value, sorted
/// ascending. With no usable input the result has zero rows but the full
/// column schema.
pub fn build_date_dimension(raw: &DataFrame, date_columns: &[&str]) -> Result<DataFrame> {
    let mut dates = BTreeSet::new();
    for name in date_columns {
        let Ok(column) = raw.column(name) else {
            tracing::debug!("Date column '{name}' not in source, skipping");
            continue;
        };
        dates.extend(parse_dates(column)?.into_iter().flatten());
    }

    let dim = date_dimension_frame(&dates)?;
    tracing::debug!("Built dim_date with {} rows", dim.height());
    Ok(dim)
}

fn date_dimension_frame(dates: &BTreeSet<NaiveDate>) -> Result<DataFrame> {
    let n = dates.len();
    let mut keys = Vec::with_capacity(n);
    let mut days = Vec::with_capacity(n);
    let mut years = Vec::with_capacity(n);
    let mut quarters = Vec::with_capacity(n);
    let mut months = Vec::with_capacity(n);
    let mut month_names = Vec::with_capacity(n);
    let mut days_of_month = Vec::with_capacity(n);
    let mut weekdays = Vec::with_capacity(n);
    let mut weekday_names = Vec::with_capacity(n);
    let mut weeks = Vec::with_capacity(n);

    for date in dates {
        let month0 = date.month0() as usize;
        let weekday0 = date.weekday().num_days_from_monday() as usize;

        keys.push(date_key(*date));
        days.push(epoch_days(*date));
        years.push(date.year());
        quarters.push((month0 / 3 + 1) as i32);
        months.push(date.month() as i32);
        month_names.push(MONTH_NAMES.get(month0).copied().unwrap_or_default());
        days_of_month.push(date.day() as i32);
        weekdays.push(weekday0 as i32 + 1);
        weekday_names.push(DAY_NAMES.get(weekday0).copied().unwrap_or_default());
        weeks.push(date.iso_week().week() as i32);
    }

    let date_col = Series::new(DATE.into(), days).cast(&DataType::Date)?;

    let dim = DataFrame::new(vec![
        Column::from(Series::new(DATE_KEY.into(), keys)),
        Column::from(date_col),
        Column::from(Series::new(YEAR.into(), years)),
        Column::from(Series::new(QUARTER.into(), quarters)),
        Column::from(Series::new(MONTH.into(), months)),
        Column::from(Series::new(MONTH_NAME.into(), month_names)),
        Column::from(Series::new(DAY.into(), days_of_month)),
        Column::from(Series::new(DAY_OF_WEEK.into(), weekdays)),
        Column::from(Series::new(DAY_OF_WEEK_NAME.into(), weekday_names)),
        Column::from(Series::new(WEEK_OF_YEAR.into(), weeks)),
    ])?;
    Ok(dim)
}

/// Exact-match map from calendar date to `DateKey`, built from a date dimension.
#[derive(Debug, Clone, Default)]
pub struct DateLookup {
    keys: HashMap<NaiveDate, i32>,
}

impl DateLookup {
    pub fn from_dimension(dim_date: &DataFrame) -> Result<Self> {
        let (Ok(date_col), Ok(key_col)) = (dim_date.column(DATE), dim_date.column(DATE_KEY))
        else {
            return Ok(Self::default());
        };

        let dates = parse_dates(date_col)?;
        let keys = key_col.as_materialized_series().cast(&DataType::Int32)?;
        let keys = dates
            .into_iter()
            .zip(keys.i32()?)
            .filter_map(|(date, key)| Some((date?, key?)))
            .collect();

        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, date: &NaiveDate) -> Option<i32> {
        self.keys.get(date).copied()
    }

    /// Resolves `column` of `raw` row by row. An absent column yields all nulls.
    pub fn resolve(&self, raw: &DataFrame, column: &str) -> Result<Vec<Option<i32>>> {
        let Ok(column) = raw.column(column) else {
            return Ok(vec![None; raw.height()]);
        };
        Ok(parse_dates(column)?
            .into_iter()
            .map(|date| date.and_then(|d| self.get(&d)))
            .collect())
    }
}
