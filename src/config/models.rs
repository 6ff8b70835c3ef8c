use crate::humanize::HumanDuration;
use crate::ledger::{DEFAULT_LEDGER_FILE, StoreOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Directory that relative paths below resolve against.
    /// Defaults to the directory holding the executable.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub shortener: ShortenerConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(executable_dir)
    }

    pub fn ledger_dir(&self) -> PathBuf {
        resolve(&self.base_dir(), &self.ledger.dir)
    }

    pub fn logs_dir(&self) -> PathBuf {
        resolve(&self.base_dir(), &self.logging.dir)
    }

    /// Options for opening the ledger store
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions::new(self.ledger_dir())
            .with_file_name(self.ledger.file_name.clone())
            .with_retention(self.ledger.retention.to_chrono())
    }
}

/// Directory of the running executable, falling back to the working directory
pub fn executable_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Object storage (MinIO / S3) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Endpoint URL, e.g. `https://minio.example.com`
    pub endpoint: Option<String>,
    /// Access key (loaded from environment, not from config file)
    #[serde(skip)]
    pub access_key: Option<String>,
    /// Secret key (loaded from environment, not from config file)
    #[serde(skip)]
    pub secret_key: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_public_bucket")]
    pub public_bucket: String,
    #[serde(default = "default_private_bucket")]
    pub private_bucket: String,
    /// Lifetime of presigned links for private uploads
    #[serde(default = "default_presign_expiry")]
    pub presign_expiry: HumanDuration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            access_key: None,
            secret_key: None,
            region: default_region(),
            public_bucket: default_public_bucket(),
            private_bucket: default_private_bucket(),
            presign_expiry: default_presign_expiry(),
        }
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_public_bucket() -> String {
    "minls-public".to_string()
}

fn default_private_bucket() -> String {
    "minls-private".to_string()
}

fn default_presign_expiry() -> HumanDuration {
    HumanDuration::from_days(7)
}

/// YOURLS shortener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShortenerConfig {
    /// API endpoint, e.g. `https://sho.rt/yourls-api.php`
    pub endpoint: Option<String>,
    /// Signature token (loaded from environment, not from config file)
    #[serde(skip)]
    pub signature: Option<String>,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_request_timeout")]
    pub timeout: HumanDuration,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            signature: None,
            title: default_title(),
            timeout: default_request_timeout(),
        }
    }
}

fn default_title() -> String {
    "Uploaded using minls".to_string()
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

/// Ledger location and retention
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default = "default_ledger_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_ledger_file")]
    pub file_name: String,
    #[serde(default = "default_ledger_retention")]
    pub retention: HumanDuration,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dir: default_ledger_dir(),
            file_name: default_ledger_file(),
            retention: default_ledger_retention(),
        }
    }
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_ledger_file() -> String {
    DEFAULT_LEDGER_FILE.to_string()
}

fn default_ledger_retention() -> HumanDuration {
    HumanDuration::from_days(7)
}

/// Log output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logs_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log files older than this are deleted in the background
    #[serde(default = "default_logs_retention")]
    pub retention: HumanDuration,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logs_dir(),
            level: default_log_level(),
            retention: default_logs_retention(),
        }
    }
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_logs_retention() -> HumanDuration {
    HumanDuration::from_days(30)
}
