use std::path::PathBuf;

use thiserror::Error;

use crate::search::SearchOutcome;

/// Errors raised while building, loading or querying an index
#[derive(Error, Debug)]
pub enum Error {
    #[error("Expression syntax error: {0}")]
    Syntax(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Cannot access index file {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupted index file {path}: {message}")]
    Decode { path: PathBuf, message: String },

    #[error("Cannot read document {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not find the folder {0}")]
    NotADirectory(PathBuf),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The query failed once its words had been looked up; `outcome` holds
    /// the words found and missing at that point
    #[error("{source}")]
    Query {
        outcome: Box<SearchOutcome>,
        source: Box<Error>,
    },
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Decode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// The underlying error, without the query diagnostics
    pub fn cause(&self) -> &Error {
        match self {
            Error::Query { source, .. } => source.cause(),
            error => error,
        }
    }

    /// Per-word diagnostics gathered before the query failed
    pub fn outcome(&self) -> Option<&SearchOutcome> {
        match self {
            Error::Query { outcome, .. } => Some(outcome.as_ref()),
            _ => None,
        }
    }

    /// Whether the error concerns the expression rather than the index
    pub fn is_query_error(&self) -> bool {
        matches!(self.cause(), Error::Syntax(_) | Error::Evaluation(_))
    }
}
