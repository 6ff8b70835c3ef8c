use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::entry::{Entry, EntryDraft, Ledger};
use super::error::{InitError, ReadError, RemoveError, WriteError};
use super::pruning::{RETENTION_ENTRIES_DAYS, evict_expired};

pub const DEFAULT_LEDGER_FILE: &str = "minls.data.json";

/// Where the ledger lives and how long entries are kept
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub dir: PathBuf,
    pub file_name: String,
    pub retention: Duration,
}

impl StoreOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            file_name: DEFAULT_LEDGER_FILE.to_string(),
            retention: Duration::days(RETENTION_ENTRIES_DAYS),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

/// JSON-file backed ledger of uploads.
///
/// The file is loaded once by [`LedgerStore::init`], pruned in memory, and
/// rewritten in full on every [`LedgerStore::write_entry`]. Pruning alone never
/// rewrites the file. There is no cross-process locking: two concurrent
/// writers race and the last one wins.
#[derive(Debug)]
pub struct LedgerStore {
    options: StoreOptions,
    ledger: Option<Ledger>,
}

impl LedgerStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            options,
            ledger: None,
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Full path of the ledger file
    pub fn path(&self) -> PathBuf {
        self.options.dir.join(&self.options.file_name)
    }

    pub fn is_initialized(&self) -> bool {
        self.ledger.is_some()
    }

    /// Create the storage directory and file if needed, load and prune
    pub fn init(&mut self) -> Result<&Ledger, InitError> {
        let dir = &self.options.dir;
        info!("Opening ledger store at: {}", dir.display());

        ensure_dir(dir)?;
        let path = self.path();
        ensure_file(&path)?;

        let mut ledger = read_ledger(&path)?;

        // Taken before eviction so ids of pruned entries are never handed out again
        let high_water = ledger.latest_id();
        let (entries, stats) = evict_expired(
            std::mem::take(&mut ledger.entries),
            self.options.retention,
            Utc::now(),
        );
        ledger.entries = entries;
        if high_water > 0 {
            ledger.last_id = Some(high_water);
        }

        info!(
            kept = stats.kept,
            evicted = stats.evicted,
            last_id = high_water,
            "Ledger loaded"
        );

        Ok(self.ledger.insert(ledger))
    }

    /// Validate `draft`, append it and persist the whole ledger.
    ///
    /// The file is replaced via a synced temp file and a rename, so a failed
    /// write leaves the previous content in place. The in-memory ledger only
    /// changes once the file is committed.
    pub fn write_entry(&mut self, draft: EntryDraft) -> Result<Entry, WriteError> {
        let path = self.path();
        let ledger = self.ledger.as_mut().ok_or(WriteError::NotInitialized)?;

        let entry = draft.validate(ledger)?;

        let mut next = ledger.clone();
        next.last_id = Some(next.latest_id().max(entry.id));
        next.entries.push(entry.clone());

        let bytes = serde_json::to_vec(&next)?;
        persist(&path, &bytes)?;
        *ledger = next;

        info!(id = entry.id, path = %path.display(), "Ledger entry written");
        Ok(entry)
    }

    /// Current ledger.
    ///
    /// After `init` this is the pruned in-memory copy. Before `init` the file
    /// is read as-is (no pruning); a missing or empty file yields an empty
    /// ledger.
    pub fn read_data(&self) -> Result<Ledger, ReadError> {
        if let Some(ledger) = &self.ledger {
            return Ok(ledger.clone());
        }

        let path = self.path();
        match read_ledger(&path) {
            Err(ReadError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Ledger file missing, returning empty ledger");
                Ok(Ledger::default())
            }
            other => other,
        }
    }

    /// Delete the storage directory with everything in it
    pub fn remove_all(&mut self) -> Result<(), RemoveError> {
        let dir = &self.options.dir;
        match fs::remove_dir_all(dir) {
            Ok(()) => info!("Removed ledger storage at: {}", dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Ledger storage already absent: {}", dir.display())
            }
            Err(source) => {
                return Err(RemoveError {
                    path: dir.clone(),
                    source,
                });
            }
        }

        self.ledger = None;
        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> Result<(), InitError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(InitError::NotADirectory(dir.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Creating storage directory: {}", dir.display());
            create_private_dir(dir).map_err(|source| InitError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(InitError::Io {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

fn ensure_file(path: &Path) -> Result<(), InitError> {
    let mut options = fs::OpenOptions::new();
    options.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path).map(|_| ()).map_err(|source| InitError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_ledger(path: &Path) -> Result<Ledger, ReadError> {
    let raw = fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    // A freshly created file has no content yet
    if raw.trim().is_empty() {
        return Ok(Ledger::default());
    }

    serde_json::from_str(&raw).map_err(|source| ReadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn persist(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    let io_err = |source: std::io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;

    Ok(())
}
