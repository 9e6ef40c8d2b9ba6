//! Error types for bioconv

use thiserror::Error;

/// Result type alias for converter operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Main error type for converter runs
///
/// Any error returned from a converter aborts the whole run; there are no
/// retries.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: expected at least {expected} columns, got {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: invalid value for {field}: '{value}'")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: row is not valid UTF-8")]
    InvalidEncoding { line: usize },

    #[error("Code '{code}' refers to parent '{parent}', which never appears in the input")]
    UnresolvedParent { code: String, parent: String },

    #[error("Cycle detected in hierarchy at code '{0}'")]
    HierarchyCycle(String),

    #[error("Unknown {kind}: '{key}'")]
    UnknownLookup { kind: &'static str, key: String },

    #[error("Missing required option: {0}")]
    MissingOption(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ConvertError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the input data rather than the environment
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedRow { .. }
                | Self::InvalidField { .. }
                | Self::InvalidEncoding { .. }
                | Self::UnresolvedParent { .. }
                | Self::HierarchyCycle(_)
                | Self::UnknownLookup { .. }
                | Self::Parse(_)
        )
    }
}
