use std::path::PathBuf;

use thiserror::Error;

/// Failure of the account backend (file I/O or (de)serialization).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read account store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write account store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("account store is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("account store could not be loaded or set aside; refusing to overwrite it")]
    ReadOnly,
}

/// Reasons a registration attempt is rejected.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("All fields are required")]
    MissingFields,
    #[error("Username already exists")]
    DuplicateUsername,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error(
        "Password must be at least 8 characters and contain an uppercase letter, \
         a lowercase letter, a digit and a special character"
    )]
    WeakPassword,
    #[error("failed to hash password: {0}")]
    Hashing(String),
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl RegisterError {
    /// Validation failures are the caller's fault; the rest are ours.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingFields | Self::DuplicateUsername | Self::InvalidEmail | Self::WeakPassword
        )
    }
}

/// The materials table could not be loaded.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("data file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read data file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("data file {path} is malformed: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("unsupported data file format: {0}")]
    Unsupported(PathBuf),
}

/// A search could not be applied to the table.
#[derive(Debug, Error, PartialEq)]
pub enum SearchError {
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("column {0} is not a text column")]
    NotText(String),
    #[error("column {0} is not a numeric column")]
    NotNumeric(String),
    #[error("invalid range [{min}, {max}]")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid search term: {0}")]
    Pattern(String),
}
