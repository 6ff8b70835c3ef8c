/// Local ledger of completed uploads
///
/// The ledger is a single JSON document kept next to the executable:
///
/// ```json
/// {"entries": [{"id": 1, "timestamp": "...", "minio_link": "...", "yourls_link": "..."}], "last_id": 1}
/// ```
///
/// ## Lifecycle
///
/// - `LedgerStore::init` loads the file once per process and prunes entries
///   older than the retention window in memory.
/// - `LedgerStore::write_entry` assigns the next id, appends and rewrites the
///   whole file. This is also the only point where pruned entries disappear
///   from disk, so read-only commands never rewrite the file.
/// - `LedgerStore::remove_all` wipes the storage directory.
///
/// ## Retention
///
/// - Entries: 7 days by default (configurable via `[ledger] retention`)
///
/// ## Usage
///
/// ```rust,ignore
/// use minls::ledger::{EntryDraft, LedgerStore, StoreOptions};
///
/// let mut store = LedgerStore::new(StoreOptions::new("data"));
/// store.init()?;
/// let entry = store.write_entry(EntryDraft::new(object_link, short_link))?;
/// ```

pub mod entry;
pub mod error;
pub mod pruning;
pub mod store;

pub use entry::{Entry, EntryDraft, Ledger};
pub use error::{InitError, LinkField, ReadError, RemoveError, ValidationError, WriteError};
pub use pruning::{PruneStats, RETENTION_ENTRIES_DAYS};
pub use store::{DEFAULT_LEDGER_FILE, LedgerStore, StoreOptions};
