//! Centralized error handling for the warehouse builder.
//!
//! Only a handful of conditions are fatal. Everything else the builders meet
//! (absent columns, unparseable dates, natural keys with no dimension match)
//! degrades to narrower schemas or null keys and never reaches this type.
//!
//! ```
//! use ecommerce_warehouse::error::WarehouseError;
//!
//! fn describe(err: &WarehouseError) -> &'static str {
//!     match err {
//!         WarehouseError::SourceNotFound(_) | WarehouseError::SourceRead(_) => "source",
//!         WarehouseError::MissingWarehouseFiles { .. } => "cache",
//!         _ => "other",
//!     }
//! }
//! ```
//!
//! The [`ResultExt`] trait adds `.context()` to any result whose error converts
//! into [`WarehouseError`]:
//!
//! ```no_run
//! use ecommerce_warehouse::error::ResultExt as _;
//!
//! fn read_manifest() -> ecommerce_warehouse::error::Result<String> {
//!     std::fs::read_to_string("warehouse.json").context("Failed to read warehouse config")
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

/// Main error type for warehouse operations.
#[derive(Debug)]
pub enum WarehouseError {
    /// I/O errors while reading or writing table files
    Io(std::io::Error),

    /// The raw dataset path does not exist
    SourceNotFound(PathBuf),

    /// The raw dataset exists but could not be parsed
    SourceRead(String),

    /// Polars failures while deriving tables
    DataProcessing(String),

    /// The persisted table set is incomplete and rebuilding was not allowed
    MissingWarehouseFiles {
        dir: PathBuf,
        missing: Vec<String>,
    },

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for WarehouseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::SourceNotFound(path) => write!(f, "Source file not found: {}", path.display()),
            Self::SourceRead(msg) => write!(f, "Failed to read source dataset: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::MissingWarehouseFiles { dir, missing } => write!(
                f,
                "Warehouse files not found in {}: {}",
                dir.display(),
                missing.join(", ")
            ),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for WarehouseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WarehouseError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<anyhow::Error> for WarehouseError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<serde_json::Error> for WarehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for WarehouseError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::DataProcessing(err.to_string())
    }
}

impl WarehouseError {
    /// Prepends `context` to the message while keeping the variant.
    ///
    /// Structured variants carry paths rather than messages and are returned
    /// unchanged.
    pub fn with_prefix(self, context: &str) -> Self {
        match self {
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{context}: {e}"))),
            Self::SourceRead(msg) => Self::SourceRead(format!("{context}: {msg}")),
            Self::DataProcessing(msg) => Self::DataProcessing(format!("{context}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{context}: {msg}")),
            Self::Other(msg) => Self::Other(format!("{context}: {msg}")),
            err @ (Self::SourceNotFound(_) | Self::MissingWarehouseFiles { .. }) => err,
        }
    }
}

/// Result type alias for warehouse operations.
pub type Result<T> = std::result::Result<T, WarehouseError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<WarehouseError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        let msg: String = msg.into();
        self.map_err(|e| Into::<WarehouseError>::into(e).with_prefix(&msg))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Into::<WarehouseError>::into(e).with_prefix(&f()))
    }
}
