use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use ecommerce_warehouse::config::WarehouseConfig;
use ecommerce_warehouse::model::TableSummary;
use ecommerce_warehouse::source::{convert_source, load_source};
use ecommerce_warehouse::warehouse::{build_warehouse, load_star_schema_with_report};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ecommerce-warehouse",
    about = "Build and cache a star-schema warehouse from e-commerce orders"
)]
pub struct Cli {
    /// Path to a JSON settings file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build every table from the source and write the warehouse
    Build {
        /// Raw order dataset (CSV, Parquet, JSON, Excel)
        #[arg(short, long, env = "WAREHOUSE_SOURCE")]
        source: Option<PathBuf>,

        /// Warehouse directory
        #[arg(short, long, env = "WAREHOUSE_DIR")]
        out: Option<PathBuf>,
    },
    /// Load the warehouse, rebuilding it first if any table file is missing
    Load {
        /// Warehouse directory
        #[arg(short, long, env = "WAREHOUSE_DIR")]
        dir: Option<PathBuf>,

        /// Raw order dataset used when a rebuild is needed
        #[arg(short, long, env = "WAREHOUSE_SOURCE")]
        source: Option<PathBuf>,

        /// Fail instead of rebuilding when files are missing
        #[arg(long)]
        no_build: bool,
    },
    /// Load the source dataset and print its shape
    Check {
        #[arg(short, long, env = "WAREHOUSE_SOURCE")]
        source: Option<PathBuf>,
    },
    /// Convert a source dataset (e.g. an Excel workbook) to Parquet, or CSV with a .csv output
    Convert {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

pub fn run_command(command: Commands, config: &WarehouseConfig) -> Result<()> {
    match command {
        Commands::Build { source, out } => handle_build(
            source.unwrap_or_else(|| config.source_path.clone()),
            out.unwrap_or_else(|| config.warehouse_dir.clone()),
        ),
        Commands::Load {
            dir,
            source,
            no_build,
        } => handle_load(
            dir.unwrap_or_else(|| config.warehouse_dir.clone()),
            source.unwrap_or_else(|| config.source_path.clone()),
            !no_build,
        ),
        Commands::Check { source } => {
            handle_check(source.unwrap_or_else(|| config.source_path.clone()))
        }
        Commands::Convert { input, output } => handle_convert(input, output),
    }
}

fn print_tables(tables: &[TableSummary]) {
    for table in tables {
        println!("  {table}");
    }
}

fn handle_build(source: PathBuf, out: PathBuf) -> Result<()> {
    let (_, report) = build_warehouse(&out, &source)
        .with_context(|| format!("Failed to build warehouse from {}", source.display()))?;

    println!("{}", report.summary());
    println!("Tables written to {}/", out.display());
    print_tables(&report.tables);
    Ok(())
}

fn handle_load(dir: PathBuf, source: PathBuf, build_if_missing: bool) -> Result<()> {
    let (_, report) = load_star_schema_with_report(&dir, &source, build_if_missing)?;

    println!("{}", report.summary());
    print_tables(&report.tables);
    Ok(())
}

fn handle_check(source: PathBuf) -> Result<()> {
    let raw = load_source(&source)?;
    println!(
        "Dataset {} loaded with shape ({}, {})",
        source.display(),
        raw.height(),
        raw.width()
    );
    for name in raw.get_column_names() {
        println!("  {name}");
    }
    Ok(())
}

fn handle_convert(input: PathBuf, output: PathBuf) -> Result<()> {
    let rows = convert_source(&input, &output)?;
    println!("Converted {rows} rows to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory as _;

    fn arg_env(subcommand: &str, arg: &str) -> Option<String> {
        let command = Cli::command();
        let sub = command.find_subcommand(subcommand)?;
        let arg = sub.get_arguments().find(|a| a.get_id() == arg)?;
        arg.get_env().map(|env| env.to_string_lossy().into_owned())
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_paths_bind_environment_variables() {
        assert_eq!(arg_env("build", "source").as_deref(), Some("WAREHOUSE_SOURCE"));
        assert_eq!(arg_env("build", "out").as_deref(), Some("WAREHOUSE_DIR"));
        assert_eq!(arg_env("load", "dir").as_deref(), Some("WAREHOUSE_DIR"));
        assert_eq!(arg_env("load", "source").as_deref(), Some("WAREHOUSE_SOURCE"));
        assert_eq!(arg_env("check", "source").as_deref(), Some("WAREHOUSE_SOURCE"));
        assert_eq!(arg_env("convert", "input"), None);
    }

    #[test]
    fn test_load_flags_parse() {
        let cli = Cli::try_parse_from([
            "ecommerce-warehouse",
            "load",
            "--dir",
            "wh",
            "--no-build",
            "--config",
            "settings.json",
        ])
        .expect("valid arguments");

        assert_eq!(cli.config, Some(PathBuf::from("settings.json")));
        match cli.command {
            Commands::Load { dir, no_build, .. } => {
                assert_eq!(dir, Some(PathBuf::from("wh")));
                assert!(no_build);
            }
            _ => panic!("expected the load subcommand"),
        }
    }
}
