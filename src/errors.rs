use chrono::NaiveDate;
use thiserror::Error;

/// Reasons a ledger header cannot be used for reading or writing counts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// Header has neither refrigerator nor shelf quantity columns
    #[error("ledger header has no refrigerator or shelf quantity columns")]
    NoLocationColumns,

    /// Two columns claim the same location identifier
    #[error("location {location} is claimed by both column {first} and column {second}")]
    DuplicateLocation {
        location: String,
        first: usize,
        second: usize,
    },

    /// A required field column is absent
    #[error("ledger header has no {field} column")]
    MissingColumn { field: &'static str },
}

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Query or connection failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Ledger header cannot be used
    #[error("Malformed ledger: {0}")]
    Structural(#[from] StructuralError),

    /// No dated count exists for the date
    #[error("No saved inventory count for {date}")]
    SnapshotNotFound { date: NaiveDate },

    /// Store has no sheet with this title
    #[error("Sheet not found: {title}")]
    SheetNotFound { title: String },

    /// Store already has a sheet with this title
    #[error("Sheet already exists: {title}")]
    SheetExists { title: String },

    /// A row total exceeds the decimal range
    #[error("Total for {product} at row {row} is too large to store")]
    QuantityOverflow { product: String, row: usize },

    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable set but unusable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Row or column index out of range for the database
    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
