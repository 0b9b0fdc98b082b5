//! Command-line entry point.
//!
//! ```bash
//! ecommerce-warehouse build --source data/MundoEcommerce.parquet --out data/warehouse
//! ecommerce-warehouse load --no-build
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;
use ecommerce_warehouse::config::WarehouseConfig;
use ecommerce_warehouse::logging;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = WarehouseConfig::resolve(cli.config.as_deref())?;

    logging::init(config.log_to_file)?;

    cli::run_command(cli.command, &config)
}
