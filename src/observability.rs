//! Logging setup: console output plus one log file per run

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::Layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

const LOG_FILE_PREFIX: &str = "minls_";
const LOG_FILE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const LOG_FILE_SUFFIX: &str = ".json.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not prepare logs directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logging already initialized")]
    AlreadyInitialized,
}

/// Where log output goes
#[derive(Debug, Clone)]
pub enum LogSink {
    /// Console only
    Console,
    /// Console and a fresh file in `dir`
    ConsoleAndFile { dir: PathBuf },
}

/// Level name (`error`, `warn`, `info`, `debug`, `trace`, `off`), any case
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    level.trim().parse().ok()
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. An unknown `level` falls back to
/// `info` with a warning. The file sink writes one JSON object per line.
/// Returns the log file path when a file sink was requested.
pub fn init(level: &str, sink: &LogSink) -> Result<Option<PathBuf>, LoggingError> {
    let parsed = parse_level(level);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(parsed.unwrap_or(LevelFilter::INFO).to_string()),
    };

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let path = match sink {
        LogSink::Console => {
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .try_init()
                .map_err(|_| LoggingError::AlreadyInitialized)?;
            None
        }
        LogSink::ConsoleAndFile { dir } => {
            let (file, path) = create_log_file(dir)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(json_file_layer(file))
                .try_init()
                .map_err(|_| LoggingError::AlreadyInitialized)?;
            Some(path)
        }
    };

    if parsed.is_none() {
        tracing::warn!(level, "Unknown log level, using info");
    }

    Ok(path)
}

fn json_file_layer<S>(file: fs::File) -> impl Layer<S>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
}

fn create_log_file(dir: &Path) -> Result<(fs::File, PathBuf), LoggingError> {
    let io_err = |source: std::io::Error| LoggingError::Io {
        path: dir.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(io_err)?;

    let name = format!(
        "{}{}{}",
        LOG_FILE_PREFIX,
        chrono::Local::now().format(LOG_FILE_FORMAT),
        LOG_FILE_SUFFIX
    );
    let path = dir.join(name);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err)?;

    Ok((file, path))
}

/// Delete log files whose modification time is older than `max_age`.
///
/// Best effort: failures are printed and skipped. Returns how many files
/// were removed.
pub fn remove_old_logs(dir: &Path, max_age: Duration) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("log: could not read logs dir {}: {}", dir.display(), e);
            return 0;
        }
    };

    let now = SystemTime::now();
    let mut removed = 0;

    for entry in entries.flatten() {
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if !is_log {
            continue;
        }

        let modified = match entry.metadata().and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                eprintln!("log: could not read file info for {}: {}", path.display(), e);
                continue;
            }
        };

        let age = now.duration_since(modified).unwrap_or_default();
        if age > max_age {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => eprintln!("log: could not delete {}: {}", path.display(), e),
            }
        }
    }

    removed
}

/// Run [`remove_old_logs`] on a blocking task without waiting for it
pub fn spawn_log_pruning(dir: PathBuf, max_age: Duration) {
    tokio::task::spawn_blocking(move || {
        let removed = remove_old_logs(&dir, max_age);
        tracing::debug!(removed, dir = %dir.display(), "Old log files pruned");
    });
}

/// Delete the logs directory; a missing directory is fine
pub fn remove_logs_dir(dir: &Path) -> Result<(), LoggingError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LoggingError::Io {
            path: dir.to_path_buf(),
            source,
        }),
    }
}
