#![expect(clippy::indexing_slicing)]
use super::columns::*;
use super::*;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;

fn orders() -> DataFrame {
    df!(
        ORDER_ID => ["O1", "O2", "O3", "O4", "O5"],
        ORDER_DATE => [Some("2021-01-04"), Some("2021-01-02"), Some("N/A"), None, Some("2021-01-04")],
        SHIPPING_DATE => [Some("2021-01-06"), Some("2021-01-04"), Some("2021-01-09"), Some("2021-01-09"), None],
        CUSTOMER_ID => ["C1", "C2", "C1", "C3", "C2"],
        CUSTOMER_NAME => ["Ann", "Bea", "Ann", "Cid", "Bea"],
        SEGMENT => ["Corp", "Home", "Corp", "Corp", "Home"],
        PRODUCT_CATEGORY => ["Tech", "Auto", "Tech", "Tech", "Auto"],
        PRODUCT => ["Mouse", "Tyre", "Laptop", "Mouse", "Tyre"],
        COUNTRY => ["BR", "BR", "PT", "BR", "PT"],
        REGION => ["South", "North", "Centre", "South", "Centre"],
        STATE => ["RS", "AM", "Lisboa", "RS", "Lisboa"],
        CITY => ["Porto Alegre", "Manaus", "Lisboa", "Porto Alegre", "Lisboa"],
        SHIP_MODE => ["Standard", "Express", "Standard", "Same Day", "Express"],
        ORDER_PRIORITY => ["High", "Low", "Medium", "High", "Critical"],
        SALES => [100.0, 250.5, 80.0, 19.9, 42.0],
        QUANTITY => [1_i64, 3, 2, 1, 5],
        DISCOUNT => [0.0, 0.1, 0.0, 0.2, 0.0],
        PROFIT => [20.0, 50.0, -4.0, 1.0, 8.5],
        SHIPPING_COST => [4.0, 9.0, 3.5, 1.0, 2.0],
        AGING => [2.0, 3.0, 1.0, 5.0, 4.0]
    )
    .unwrap()
}

fn u32_values(df: &DataFrame, name: &str) -> Vec<Option<u32>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .cast(&DataType::UInt32)
        .unwrap()
        .u32()
        .unwrap()
        .into_iter()
        .collect()
}

fn i32_values(df: &DataFrame, name: &str) -> Vec<Option<i32>> {
    df.column(name)
        .unwrap()
        .as_materialized_series()
        .i32()
        .unwrap()
        .into_iter()
        .collect()
}

fn natural_tuples(df: &DataFrame, spec: &DimensionSpec) -> Vec<Vec<Option<String>>> {
    let columns = spec.present_columns(df);
    let mut rows = vec![Vec::new(); df.height()];
    for name in columns {
        let text = df
            .column(name)
            .unwrap()
            .as_materialized_series()
            .cast(&DataType::String)
            .unwrap();
        for (row, value) in rows.iter_mut().zip(text.str().unwrap()) {
            row.push(value.map(str::to_owned));
        }
    }
    rows
}

#[test]
fn test_natural_dimensions_have_unique_tuples_and_dense_keys() -> crate::error::Result<()> {
    let schema = build_star_schema(&orders())?;

    for (spec, table) in schema.dimensions.natural() {
        let tuples = natural_tuples(table, spec);
        let distinct: HashSet<_> = tuples.iter().cloned().collect();
        assert_eq!(distinct.len(), tuples.len(), "duplicate tuple in {}", spec.table);

        let keys = u32_values(table, spec.key_column);
        let expected: Vec<_> = (1..=table.height() as u32).map(Some).collect();
        assert_eq!(keys, expected, "keys of {} not dense", spec.table);
    }

    assert_eq!(schema.dimensions.customer.height(), 3);
    assert_eq!(schema.dimensions.product.height(), 3);
    assert_eq!(schema.dimensions.geography.height(), 3);
    assert_eq!(schema.dimensions.ship_mode.height(), 3);
    assert_eq!(schema.dimensions.order_priority.height(), 4);
    Ok(())
}

#[test]
fn test_date_dimension_is_union_of_valid_dates() -> crate::error::Result<()> {
    let schema = build_star_schema(&orders())?;
    let dim = &schema.dimensions.date;

    assert_eq!(
        i32_values(dim, DATE_KEY),
        vec![
            Some(20_210_102),
            Some(20_210_104),
            Some(20_210_106),
            Some(20_210_109)
        ]
    );

    let dates = parse_dates(dim.column(DATE)?)?;
    for (date, key) in dates.iter().zip(i32_values(dim, DATE_KEY)) {
        assert_eq!(date.map(date_key), key);
    }
    Ok(())
}

#[test]
fn test_fact_row_count_matches_source() -> crate::error::Result<()> {
    let raw = orders();
    let schema = build_star_schema(&raw)?;
    assert_eq!(schema.fact_sales.height(), raw.height());

    let empty = raw.clear();
    let schema = build_star_schema(&empty)?;
    assert_eq!(schema.fact_sales.height(), 0);
    assert_eq!(schema.dimensions.date.height(), 0);
    Ok(())
}

#[test]
fn test_fact_keys_point_at_matching_dimension_rows() -> crate::error::Result<()> {
    let raw = orders();
    let schema = build_star_schema(&raw)?;
    let fact = &schema.fact_sales;

    // O1 and O3 are the same customer
    let customers = u32_values(fact, "CustomerKey");
    assert_eq!(customers[0], customers[2]);
    assert_eq!(customers, vec![Some(1), Some(2), Some(1), Some(3), Some(2)]);

    // Auto/Tyre < Tech/Laptop < Tech/Mouse
    assert_eq!(
        u32_values(fact, "ProductKey"),
        vec![Some(3), Some(1), Some(2), Some(3), Some(1)]
    );

    assert_eq!(
        i32_values(fact, ORDER_DATE_KEY),
        vec![Some(20_210_104), Some(20_210_102), None, None, Some(20_210_104)]
    );
    assert_eq!(
        i32_values(fact, SHIP_DATE_KEY),
        vec![
            Some(20_210_106),
            Some(20_210_104),
            Some(20_210_109),
            Some(20_210_109),
            None
        ]
    );
    Ok(())
}

#[test]
fn test_repeated_customer_shares_key() -> crate::error::Result<()> {
    let raw = df!(CUSTOMER_NAME => ["A", "B", "A"], SALES => [1.0, 2.0, 3.0])?;
    let schema = build_star_schema(&raw)?;

    assert_eq!(schema.dimensions.customer.height(), 2);
    assert_eq!(
        u32_values(&schema.dimensions.customer, "CustomerKey"),
        vec![Some(1), Some(2)]
    );
    assert_eq!(schema.fact_sales.height(), 3);
    assert_eq!(
        u32_values(&schema.fact_sales, "CustomerKey"),
        vec![Some(1), Some(2), Some(1)]
    );
    Ok(())
}

#[test]
fn test_unparseable_order_date_is_dropped_not_fatal() -> crate::error::Result<()> {
    let raw = df!(
        ORDER_ID => ["O1", "O2"],
        ORDER_DATE => ["N/A", "2021-03-01"]
    )?;
    let schema = build_star_schema(&raw)?;

    assert_eq!(i32_values(&schema.dimensions.date, DATE_KEY), vec![Some(20_210_301)]);
    assert_eq!(
        i32_values(&schema.fact_sales, ORDER_DATE_KEY),
        vec![None, Some(20_210_301)]
    );
    assert_eq!(schema.fact_sales.height(), 2);
    Ok(())
}

#[test]
fn test_absent_ship_mode_gives_key_only_dimension() -> crate::error::Result<()> {
    let raw = orders().drop(SHIP_MODE)?;
    let schema = build_star_schema(&raw)?;

    let dim = &schema.dimensions.ship_mode;
    assert_eq!(dim.width(), 1);
    assert_eq!(dim.height(), 0);
    assert!(dim.column("ShipModeKey").is_ok());
    assert_eq!(
        schema.fact_sales.column("ShipModeKey")?.null_count(),
        raw.height()
    );
    Ok(())
}

#[test]
fn test_measures_subset_and_renames() -> crate::error::Result<()> {
    let raw = orders().drop(AGING)?.drop(DISCOUNT)?;
    let schema = build_star_schema(&raw)?;
    let names: Vec<String> = schema
        .fact_sales
        .get_column_names()
        .iter()
        .map(|c| c.as_str().to_owned())
        .collect();

    assert_eq!(
        &names[8..],
        &["Sales", "Quantity", "Profit", "ShippingCost"]
    );
    assert!(!names.iter().any(|n| n == SHIPPING_COST));
    Ok(())
}

#[test]
fn test_rebuild_is_deterministic() -> crate::error::Result<()> {
    let raw = orders();
    let first = build_star_schema(&raw)?;
    let second = build_star_schema(&raw)?;
    assert!(first.equals(&second));
    Ok(())
}

#[test]
fn test_summary_lists_all_tables() -> crate::error::Result<()> {
    let schema = build_star_schema(&orders())?;
    let summary = schema.summary();

    assert_eq!(summary.len(), 7);
    assert_eq!(summary[0].name, TableName::DimDate);
    assert_eq!(summary[6].name, TableName::FactSales);
    assert_eq!(summary[6].rows, 5);
    assert_eq!(summary[6].to_string(), "fact_sales (5, 14)");
    Ok(())
}

#[test]
fn test_table_name_parsing() {
    for name in TableName::ALL {
        assert_eq!(name.as_str().parse::<TableName>().ok(), Some(name));
    }
    assert!("dim_nope".parse::<TableName>().is_err());
}

#[test]
fn test_huge_year_is_dropped_not_fatal() -> crate::error::Result<()> {
    let raw = df!(
        ORDER_ID => ["O1", "O2"],
        ORDER_DATE => ["+250000-01-01", "2021-01-01"]
    )?;
    let schema = build_star_schema(&raw)?;

    assert_eq!(i32_values(&schema.dimensions.date, DATE_KEY), vec![Some(20_210_101)]);
    assert_eq!(
        i32_values(&schema.fact_sales, ORDER_DATE_KEY),
        vec![None, Some(20_210_101)]
    );
    Ok(())
}

#[test]
fn test_timestamps_on_one_day_share_a_date_key() -> crate::error::Result<()> {
    let day = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    let millis = |hour: u32| day.and_hms_opt(hour, 30, 0).unwrap().and_utc().timestamp_millis();

    let stamps = Series::new(ORDER_DATE.into(), [millis(9), millis(17)])
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    let raw = DataFrame::new(vec![
        Column::from(Series::new(ORDER_ID.into(), ["O1", "O2"])),
        Column::from(stamps),
    ])?;
    let schema = build_star_schema(&raw)?;

    assert_eq!(i32_values(&schema.dimensions.date, DATE_KEY), vec![Some(20_210_104)]);
    assert_eq!(
        i32_values(&schema.fact_sales, ORDER_DATE_KEY),
        vec![Some(20_210_104), Some(20_210_104)]
    );
    Ok(())
}
