//! Command handlers behind the CLI
//!
//! Each handler takes the loaded [`Config`](crate::config::Config) and owns
//! the resources it needs for the duration of the command.

mod clear;
mod list;
mod upload;
mod version;

pub use clear::run as clear;
pub use list::{render_table, run as list};
pub use upload::{
    LinkShortener, ObjectUploader, UploadError, UploadPipeline, run as upload,
};
pub use version::{render_version, run as version};

use thiserror::Error;

use crate::config::ConfigError;
use crate::ledger::{InitError, ReadError, RemoveError};
use crate::observability::LoggingError;
use crate::shortener::ShortenError;
use crate::storage::StorageError;

/// Any failure a command can end with
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("could not open ledger: {0}")]
    LedgerInit(#[from] InitError),

    #[error("could not read ledger: {0}")]
    LedgerRead(#[from] ReadError),

    #[error("could not clear ledger: {0}")]
    LedgerRemove(#[from] RemoveError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Shortener(#[from] ShortenError),

    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
}
