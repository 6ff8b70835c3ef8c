use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use super::CommandError;
use crate::clipboard;
use crate::config::Config;
use crate::ledger::{Entry, EntryDraft, InitError, LedgerStore, WriteError};
use crate::shortener::{ShortenError, ShortenerClient};
use crate::storage::{StorageClient, StorageError, Visibility};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("could not inspect {}: {source}", .path.display())]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Shorten(#[from] ShortenError),

    #[error("could not open ledger: {0}")]
    LedgerInit(#[from] InitError),

    #[error("could not record upload: {0}")]
    LedgerWrite(#[from] WriteError),

    #[error("cancelled")]
    Cancelled,
}

/// Puts a local file somewhere reachable and returns its link
#[async_trait]
pub trait ObjectUploader: Send + Sync {
    async fn upload_object(&self, path: &Path, visibility: Visibility)
    -> Result<String, StorageError>;
}

/// Turns a long link into a short one
#[async_trait]
pub trait LinkShortener: Send + Sync {
    async fn shorten_link(&self, long_url: &str) -> Result<String, ShortenError>;
}

#[async_trait]
impl ObjectUploader for StorageClient {
    async fn upload_object(
        &self,
        path: &Path,
        visibility: Visibility,
    ) -> Result<String, StorageError> {
        self.upload_file(path, visibility).await
    }
}

#[async_trait]
impl LinkShortener for ShortenerClient {
    async fn shorten_link(&self, long_url: &str) -> Result<String, ShortenError> {
        self.shorten(long_url).await
    }
}

/// Upload, shorten, record
pub struct UploadPipeline<U, S> {
    uploader: U,
    shortener: S,
}

impl<U: ObjectUploader, S: LinkShortener> UploadPipeline<U, S> {
    pub fn new(uploader: U, shortener: S) -> Self {
        Self {
            uploader,
            shortener,
        }
    }

    /// Run every step and return the recorded entry.
    ///
    /// The ledger is initialized on first use. Nothing is written unless both
    /// network steps succeeded.
    pub async fn run(
        &self,
        path: &Path,
        visibility: Visibility,
        ledger: &mut LedgerStore,
    ) -> Result<Entry, UploadError> {
        check_file(path).await?;

        if !ledger.is_initialized() {
            ledger.init()?;
        }

        let object_link = self.uploader.upload_object(path, visibility).await?;
        info!(path = %path.display(), ?visibility, "File uploaded");

        let short_link = self.shortener.shorten_link(&object_link).await?;
        info!(short_link = %short_link, "Link shortened");

        let entry = ledger.write_entry(EntryDraft::new(object_link, short_link))?;
        Ok(entry)
    }

    /// [`run`](Self::run), abandoned as soon as `cancel` completes.
    ///
    /// The ledger write is the last step and does not yield, so a cancelled
    /// run never leaves an entry behind.
    pub async fn run_until<C>(
        &self,
        path: &Path,
        visibility: Visibility,
        ledger: &mut LedgerStore,
        cancel: C,
    ) -> Result<Entry, UploadError>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run(path, visibility, ledger) => result,
            _ = cancel => {
                warn!(path = %path.display(), "Upload cancelled");
                Err(UploadError::Cancelled)
            }
        }
    }
}

async fn check_file(path: &Path) -> Result<(), UploadError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(UploadError::NotAFile(path.to_path_buf())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(UploadError::FileNotFound(path.to_path_buf()))
        }
        Err(source) => Err(UploadError::Inspect {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Completes on Ctrl-C; never completes if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

/// `minls upload <FILE> <public|private>`
pub async fn run(config: &Config, file: &Path, visibility: Visibility) -> Result<(), CommandError> {
    config.validate_for_upload()?;

    let storage = StorageClient::from_config(&config.storage)?;
    let shortener = ShortenerClient::new(&config.shortener)?;
    let pipeline = UploadPipeline::new(storage, shortener);

    let mut store = LedgerStore::new(config.store_options());
    let entry = pipeline
        .run_until(file, visibility, &mut store, ctrl_c())
        .await?;

    info!(id = entry.id, "Upload recorded");

    match clipboard::copy(&entry.short_link) {
        Ok(()) => info!("Short link copied to clipboard"),
        Err(e) => warn!(error = %e, "Could not copy short link to clipboard"),
    }

    println!("{}", entry.short_link);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::StoreOptions;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeUploader {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ObjectUploader for FakeUploader {
        async fn upload_object(
            &self,
            path: &Path,
            visibility: Visibility,
        ) -> Result<String, StorageError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StorageError::SigningUnavailable("minls-private".to_string()));
            }
            let name = path.file_name().unwrap().to_str().unwrap();
            let bucket = match visibility {
                Visibility::Public => "minls-public",
                Visibility::Private => "minls-private",
            };
            Ok(format!("https://store.example/{bucket}/{name}"))
        }
    }

    #[derive(Default)]
    struct FakeShortener {
        seen: Mutex<Vec<String>>,
        hang: bool,
    }

    #[async_trait]
    impl LinkShortener for FakeShortener {
        async fn shorten_link(&self, long_url: &str) -> Result<String, ShortenError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            let mut seen = self.seen.lock().unwrap();
            seen.push(long_url.to_string());
            Ok(format!("https://sho.rt/{}", seen.len()))
        }
    }

    fn setup() -> (TempDir, PathBuf, LedgerStore) {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("shot.png");
        std::fs::write(&file, b"png").unwrap();
        let store = LedgerStore::new(StoreOptions::new(temp_dir.path().join("data")));
        (temp_dir, file, store)
    }

    #[tokio::test]
    async fn test_pipeline_records_entry() {
        let (_temp_dir, file, mut store) = setup();
        let pipeline = UploadPipeline::new(FakeUploader::default(), FakeShortener::default());

        let entry = pipeline.run(&file, Visibility::Public, &mut store).await.unwrap();

        assert_eq!(entry.id, 1);
        assert_eq!(entry.object_link, "https://store.example/minls-public/shot.png");
        assert_eq!(entry.short_link, "https://sho.rt/1");
        assert_eq!(
            pipeline.shortener.seen.lock().unwrap().as_slice(),
            ["https://store.example/minls-public/shot.png"]
        );

        let second = pipeline.run(&file, Visibility::Private, &mut store).await.unwrap();
        assert_eq!(second.id, 2);

        let on_disk = LedgerStore::new(store.options().clone()).read_data().unwrap();
        assert_eq!(on_disk.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_file_stops_before_upload() {
        let (temp_dir, _file, mut store) = setup();
        let pipeline = UploadPipeline::new(FakeUploader::default(), FakeShortener::default());

        let err = pipeline
            .run(&temp_dir.path().join("nope.png"), Visibility::Public, &mut store)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::FileNotFound(_)));
        assert_eq!(pipeline.uploader.calls.load(Ordering::SeqCst), 0);

        let err = pipeline
            .run(temp_dir.path(), Visibility::Public, &mut store)
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::NotAFile(_)));
    }

    #[tokio::test]
    async fn test_failed_upload_writes_nothing() {
        let (_temp_dir, file, mut store) = setup();
        let uploader = FakeUploader {
            fail: true,
            ..Default::default()
        };
        let pipeline = UploadPipeline::new(uploader, FakeShortener::default());

        let err = pipeline.run(&file, Visibility::Private, &mut store).await.unwrap_err();

        assert!(matches!(err, UploadError::Storage(_)));
        assert!(pipeline.shortener.seen.lock().unwrap().is_empty());
        assert!(store.read_data().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_before_write() {
        let (_temp_dir, file, mut store) = setup();
        let shortener = FakeShortener {
            hang: true,
            ..Default::default()
        };
        let pipeline = UploadPipeline::new(FakeUploader::default(), shortener);

        let cancel = tokio::time::sleep(std::time::Duration::from_millis(50));
        let err = pipeline
            .run_until(&file, Visibility::Public, &mut store, cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Cancelled));
        assert_eq!(pipeline.uploader.calls.load(Ordering::SeqCst), 1);
        assert!(store.read_data().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_in_memory_storage_end_to_end() {
        let (_temp_dir, file, mut store) = setup();
        let storage = StorageClient::in_memory("http://127.0.0.1:9000").unwrap();
        let pipeline = UploadPipeline::new(storage, FakeShortener::default());

        let entry = pipeline.run(&file, Visibility::Public, &mut store).await.unwrap();

        assert!(entry.object_link.starts_with("http://127.0.0.1:9000/minls-public/"));
        assert!(entry.object_link.ends_with(".png"));
    }
}
