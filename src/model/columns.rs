//! Column names of the raw order dataset and of the derived tables.
//!
//! Raw names are matched exactly and case-sensitively. Every one of them is
//! optional in a given source.

pub const ORDER_ID: &str = "Order ID";
pub const ORDER_DATE: &str = "Order Date";
pub const SHIPPING_DATE: &str = "Shipping Date";
pub const SHIP_MODE: &str = "Ship Mode";
pub const PRODUCT_CATEGORY: &str = "Product Category";
pub const PRODUCT: &str = "Product";
pub const SALES: &str = "Sales";
pub const QUANTITY: &str = "Quantity";
pub const DISCOUNT: &str = "Discount";
pub const PROFIT: &str = "Profit";
pub const SHIPPING_COST: &str = "Shipping Cost";
pub const ORDER_PRIORITY: &str = "Order Priority";
pub const CUSTOMER_ID: &str = "Customer ID";
pub const CUSTOMER_NAME: &str = "Customer Name";
pub const SEGMENT: &str = "Segment";
pub const CITY: &str = "City";
pub const STATE: &str = "State";
pub const COUNTRY: &str = "Country";
pub const REGION: &str = "Region";
pub const AGING: &str = "Aging";

/// Measures carried into the fact table, as `(raw name, fact name)`.
pub const MEASURES: [(&str, &str); 6] = [
    (SALES, "Sales"),
    (QUANTITY, "Quantity"),
    (DISCOUNT, "Discount"),
    (PROFIT, "Profit"),
    (SHIPPING_COST, "ShippingCost"),
    (AGING, "Aging"),
];

// Date dimension
pub const DATE_KEY: &str = "DateKey";
pub const DATE: &str = "Date";
pub const YEAR: &str = "Year";
pub const QUARTER: &str = "Quarter";
pub const MONTH: &str = "Month";
pub const MONTH_NAME: &str = "MonthName";
pub const DAY: &str = "Day";
pub const DAY_OF_WEEK: &str = "DayOfWeek";
pub const DAY_OF_WEEK_NAME: &str = "DayOfWeekName";
pub const WEEK_OF_YEAR: &str = "WeekOfYear";

// Fact table
pub const ORDER_ID_KEY: &str = "OrderID";
pub const ORDER_DATE_KEY: &str = "OrderDateKey";
pub const SHIP_DATE_KEY: &str = "ShipDateKey";
