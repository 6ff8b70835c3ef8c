use super::models::{Config, executable_dir};
use config::{ConfigError, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};

const CONFIG_ENV_VAR: &str = "MINLS_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "minls.toml";
const ENV_PREFIX: &str = "MINLS";
const ENV_SEPARATOR: &str = "__";

/// Explicit overrides coming from the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Load configuration from multiple sources with priority:
/// 1. Defaults (embedded in structs)
/// 2. TOML file (if exists)
/// 3. Environment variables from .env files (via dotenvy)
/// 4. System environment variables
/// 5. Command line overrides (highest priority)
pub fn load(overrides: &Overrides) -> Result<Config, ConfigError> {
    let base_dir = overrides.base_dir.clone().unwrap_or_else(executable_dir);

    // .env next to the executable first, then the working directory.
    // dotenvy never overwrites variables that are already set.
    let _ = dotenvy::from_path(base_dir.join(".env"));
    let _ = dotenvy::dotenv();

    let config_path = overrides
        .config_path
        .clone()
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .unwrap_or_else(|| base_dir.join(DEFAULT_CONFIG_FILE));

    let mut config = load_from_sources(&config_path)?;

    // Load secrets from environment variables
    load_secrets(&mut config, |key| env::var(key).ok());

    if let Some(base_dir) = &overrides.base_dir {
        config.base_dir = Some(base_dir.clone());
    }
    if let Some(level) = &overrides.log_level {
        config.logging.level = level.clone();
    }

    Ok(config)
}

/// Fill secrets and endpoints from the plain variable names used by the
/// legacy `.env` layout. Secrets are never stored in TOML files.
pub(crate) fn load_secrets<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|value| !value.is_empty());

    if let Some(endpoint) = lookup("MINIO_ENDPOINT") {
        config.storage.endpoint = Some(endpoint);
    }
    if let Some(access_key) = lookup("MINIO_ACCESS_KEY") {
        config.storage.access_key = Some(access_key);
    }
    if let Some(secret_key) = lookup("MINIO_ACCESS_SECRET") {
        config.storage.secret_key = Some(secret_key);
    }

    // Alternative: AWS-style environment variable names
    if config.storage.access_key.is_none() {
        config.storage.access_key = lookup("AWS_ACCESS_KEY_ID");
    }
    if config.storage.secret_key.is_none() {
        config.storage.secret_key = lookup("AWS_SECRET_ACCESS_KEY");
    }

    if let Some(endpoint) = lookup("YOURLS_ENDPOINT") {
        config.shortener.endpoint = Some(endpoint);
    }
    if let Some(signature) = lookup("YOURLS_SIGNATURE") {
        config.shortener.signature = Some(signature);
    }
}

/// Load configuration from a specific path and environment
/// Useful for testing with custom config files
pub fn load_from_sources(config_path: &Path) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::debug!("Loading configuration from: {}", config_path.display());
        builder = builder.add_source(
            File::from(config_path)
                .format(FileFormat::Toml)
                .required(false),
        );
    } else {
        tracing::debug!(
            "Configuration file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // MINLS__LEDGER__RETENTION -> ledger.retention
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
