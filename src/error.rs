//! Rich diagnostic error types for surmise.
//!
//! The inference engine itself is total: clause construction, the HS-test,
//! closure, the query manager and state enumeration never fail. Errors only
//! arise at the edges, where items are loaded, answers are persisted,
//! configuration is read and experts are asked.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type.
#[derive(Debug, Error, Diagnostic)]
pub enum SurmiseError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Oracle(#[from] OracleError),
}

/// Result type alias for surmise operations.
pub type SurmiseResult<T> = std::result::Result<T, SurmiseError>;

// ---------------------------------------------------------------------------
// Dataset errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum DatasetError {
    #[error("failed to read item dataset: {path}")]
    #[diagnostic(
        code(surmise::dataset::read),
        help("Check that the dataset file exists and is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse item dataset {path}: {message}")]
    #[diagnostic(
        code(surmise::dataset::parse),
        help(
            "The dataset must be JSON: either an array of items, or an object \
             of domains mapping categories to {{\"tasks\": [...]}}. Every item \
             needs a string \"id\"."
        )
    )]
    Parse { path: String, message: String },

    #[error("duplicate item id: {id}")]
    #[diagnostic(
        code(surmise::dataset::duplicate),
        help("Item ids must be unique across all domains and categories.")
    )]
    DuplicateItem { id: String },

    #[error("item dataset is empty")]
    #[diagnostic(
        code(surmise::dataset::empty),
        help("Add at least two items; queries need an antecedent and a question.")
    )]
    Empty,
}

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;

// ---------------------------------------------------------------------------
// Answer log errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum LogError {
    #[error("I/O error on answer log {path}: {source}")]
    #[diagnostic(
        code(surmise::log::io),
        help(
            "A filesystem operation on the answer log failed. Check that the \
             directory exists, has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt answer log {path}: {message}")]
    #[diagnostic(
        code(surmise::log::corrupt),
        help(
            "The answer log could not be parsed. Start a fresh session or \
             restore the file from a backup."
        )
    )]
    Corrupt { path: String, message: String },

    #[error("failed to serialize answer log: {message}")]
    #[diagnostic(code(surmise::log::serialize))]
    Serialize { message: String },
}

pub type LogResult<T> = std::result::Result<T, LogError>;

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read session config: {path}")]
    #[diagnostic(
        code(surmise::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse session config {path}: {message}")]
    #[diagnostic(
        code(surmise::config::parse),
        help("Check the TOML syntax and field names in the session config.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write session config: {path}")]
    #[diagnostic(
        code(surmise::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid session config: {message}")]
    #[diagnostic(code(surmise::config::invalid))]
    Invalid { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Oracle errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum OracleError {
    #[error("expert input closed before an answer was given")]
    #[diagnostic(
        code(surmise::oracle::closed),
        help("Answers recorded so far are saved. Resume with --resume to continue.")
    )]
    Closed,

    #[error("expert I/O failed: {source}")]
    #[diagnostic(code(surmise::oracle::io))]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("unknown item in query: {id}")]
    #[diagnostic(
        code(surmise::oracle::unknown_item),
        help("The query mentions an item that is missing from the dataset.")
    )]
    UnknownItem { id: String },
}

impl From<std::io::Error> for OracleError {
    fn from(source: std::io::Error) -> Self {
        Self::Io { source }
    }
}

pub type OracleResult<T> = std::result::Result<T, OracleError>;
