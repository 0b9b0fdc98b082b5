//! # ecommerce-warehouse
//!
//! Restructures a flat e-commerce order dataset into a star schema: a
//! calendar dimension, five natural-key dimensions with dense surrogate keys,
//! and a `fact_sales` table whose foreign keys point into them.
//!
//! ```no_run
//! use ecommerce_warehouse::{load_star_schema, model::TableName};
//! use std::path::Path;
//!
//! // Reads the cached tables, rebuilding all of them from the source if
//! // any file is missing.
//! let schema = load_star_schema(
//!     Path::new("data/warehouse"),
//!     Path::new("data/MundoEcommerce.parquet"),
//!     true,
//! )?;
//! println!("{} fact rows", schema.table(TableName::FactSales).height());
//! # Ok::<(), ecommerce_warehouse::error::WarehouseError>(())
//! ```
//!
//! ## Modules
//!
//! - [`model`]: dimension and fact builders, and the [`StarSchema`] table set
//! - [`warehouse`]: Parquet persistence with build-if-missing loading
//! - [`source`]: raw dataset loading and format conversion
//! - [`config`], [`logging`], [`error`]: settings, tracing setup, error types

#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod source;
pub mod warehouse;

pub use error::{Result, WarehouseError};
pub use model::{StarSchema, TableName, build_star_schema};
pub use warehouse::{load_star_schema, save_star_schema};
