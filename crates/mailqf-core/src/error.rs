use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the queue filter.
#[derive(Error, Debug)]
pub enum MailqfError {
    /// An input or output file could not be opened.
    #[error("Failed to open file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A user-supplied filter expression is not valid regex syntax.
    #[error("Invalid filter pattern \"{pattern}\": {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An interval boundary string matched none of the accepted syntaxes.
    #[error("Invalid time boundary \"{0}\": expected epoch seconds, <digits><s|m|h|d>, or an ISO date/date-time")]
    InvalidBoundary(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the mailqf crates.
pub type Result<T> = std::result::Result<T, MailqfError>;
