use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which link of an entry failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    ObjectLink,
    ShortLink,
}

impl fmt::Display for LinkField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkField::ObjectLink => write!(f, "object_link"),
            LinkField::ShortLink => write!(f, "short_link"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("malformed {field} '{value}': {source}")]
    MalformedLink {
        field: LinkField,
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no ids left after {0}")]
    IdExhausted(u64),
}

impl ValidationError {
    /// The offending link, if a link was the problem
    pub fn field(&self) -> Option<LinkField> {
        match self {
            ValidationError::MalformedLink { field, .. } => Some(*field),
            ValidationError::IdExhausted(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage path {} exists but is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("could not parse ledger file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse ledger file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("ledger store used before init")]
    NotInitialized,

    #[error("entry rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
#[error("could not remove {}: {source}", .path.display())]
pub struct RemoveError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl From<ReadError> for InitError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Io { path, source } => InitError::Io { path, source },
            ReadError::Parse { path, source } => InitError::Parse { path, source },
        }
    }
}
