use super::models::Config;
use crate::humanize::HumanDuration;
use thiserror::Error;

/// Longest lifetime S3 accepts for a presigned URL
const MAX_PRESIGN_EXPIRY_DAYS: u64 = 7;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required setting {key} (set it in the environment or .env file)")]
    MissingValue { key: &'static str },

    #[error("Retention must be positive: {field} = {value}")]
    InvalidRetention { field: &'static str, value: HumanDuration },

    #[error("presign_expiry ({actual}) must be between 1s and {limit}")]
    PresignExpiryOutOfRange {
        actual: HumanDuration,
        limit: HumanDuration,
    },

    #[error("Ledger file name must be a plain file name: '{0}'")]
    InvalidLedgerFileName(String),
}

/// Validate settings every command depends on
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_retention(config)?;
    validate_ledger(config)?;
    validate_presign_expiry(config)?;
    Ok(())
}

/// Additional checks for commands that talk to MinIO and YOURLS
pub fn validate_for_upload(config: &Config) -> Result<(), ValidationError> {
    require("MINIO_ENDPOINT", &config.storage.endpoint)?;
    require("MINIO_ACCESS_KEY", &config.storage.access_key)?;
    require("MINIO_ACCESS_SECRET", &config.storage.secret_key)?;
    require("YOURLS_ENDPOINT", &config.shortener.endpoint)?;
    require("YOURLS_SIGNATURE", &config.shortener.signature)?;
    Ok(())
}

fn require(key: &'static str, value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ValidationError::MissingValue { key }),
    }
}

fn validate_retention(config: &Config) -> Result<(), ValidationError> {
    if config.ledger.retention.is_zero() {
        return Err(ValidationError::InvalidRetention {
            field: "ledger.retention",
            value: config.ledger.retention,
        });
    }

    if config.logging.retention.is_zero() {
        return Err(ValidationError::InvalidRetention {
            field: "logging.retention",
            value: config.logging.retention,
        });
    }

    Ok(())
}

fn validate_ledger(config: &Config) -> Result<(), ValidationError> {
    let name = &config.ledger.file_name;
    let plain = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\']);

    if !plain {
        return Err(ValidationError::InvalidLedgerFileName(name.clone()));
    }

    Ok(())
}

fn validate_presign_expiry(config: &Config) -> Result<(), ValidationError> {
    let limit = HumanDuration::from_days(MAX_PRESIGN_EXPIRY_DAYS);
    let actual = config.storage.presign_expiry;

    if actual.is_zero() || actual > limit {
        return Err(ValidationError::PresignExpiryOutOfRange { actual, limit });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload_ready_config() -> Config {
        let mut config = Config::default();
        config.storage.endpoint = Some("http://127.0.0.1:9000".to_string());
        config.storage.access_key = Some("minio".to_string());
        config.storage.secret_key = Some("minio123".to_string());
        config.shortener.endpoint = Some("https://sho.rt/yourls-api.php".to_string());
        config.shortener.signature = Some("abc123".to_string());
        config
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_retention_rejected() {
        let mut config = Config::default();
        config.ledger.retention = HumanDuration::from_secs(0);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidRetention { field: "ledger.retention", .. })
        ));
    }

    #[test]
    fn test_presign_expiry_limit() {
        let mut config = Config::default();
        config.storage.presign_expiry = HumanDuration::from_days(8);

        assert!(matches!(
            validate(&config),
            Err(ValidationError::PresignExpiryOutOfRange { .. })
        ));
    }

    #[test]
    fn test_ledger_file_name_must_be_plain() {
        let mut config = Config::default();
        config.ledger.file_name = "../escape.json".to_string();

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidLedgerFileName(_))
        ));
    }

    #[test]
    fn test_upload_requires_credentials() {
        assert!(validate_for_upload(&upload_ready_config()).is_ok());

        let mut config = upload_ready_config();
        config.shortener.signature = None;
        assert!(matches!(
            validate_for_upload(&config),
            Err(ValidationError::MissingValue { key: "YOURLS_SIGNATURE" })
        ));

        let mut config = upload_ready_config();
        config.storage.access_key = Some("  ".to_string());
        assert!(matches!(
            validate_for_upload(&config),
            Err(ValidationError::MissingValue { key: "MINIO_ACCESS_KEY" })
        ));
    }
}
