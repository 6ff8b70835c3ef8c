//! Object storage for uploaded files
//! Uses Apache Arrow object_store crate against a MinIO / S3 endpoint

mod buckets;

pub use buckets::{BucketProvisioner, public_read_policy};

use bytes::Bytes;
use mime::Mime;
use object_store::aws::AmazonS3Builder;
use object_store::signer::Signer;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, PutOptions, path::Path as StoragePath,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::StorageConfig;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not read {}: {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Bucket '{bucket}': {reason}")]
    Bucket { bucket: String, reason: String },

    #[error("Bucket '{0}' cannot sign URLs")]
    SigningUnavailable(String),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Which bucket an upload goes to and what kind of link comes back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Plain `<endpoint>/<bucket>/<key>` link
    Public,
    /// Presigned GET link with limited lifetime
    Private,
}

#[derive(Clone)]
struct Bucket {
    name: String,
    store: Arc<dyn ObjectStore>,
    signer: Option<Arc<dyn Signer>>,
}

/// Storage client holding the public and private buckets
#[derive(Clone)]
pub struct StorageClient {
    endpoint: Url,
    public: Bucket,
    private: Bucket,
    provisioner: Option<BucketProvisioner>,
    presign_expiry: Duration,
}

impl StorageClient {
    /// Connect both buckets on the configured MinIO endpoint
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let raw = config.endpoint.as_deref().unwrap_or_default();
        let endpoint = parse_endpoint(raw)?;

        if endpoint.scheme() != "https" {
            tracing::warn!(endpoint = %endpoint, "Object storage endpoint is not using TLS");
        }

        let public = s3_bucket(config, &endpoint, &config.public_bucket)?;
        let private = s3_bucket(config, &endpoint, &config.private_bucket)?;
        let provisioner = BucketProvisioner::new(config, &endpoint);

        Ok(Self {
            endpoint,
            public,
            private,
            provisioner: Some(provisioner),
            presign_expiry: config.presign_expiry.as_duration(),
        })
    }

    /// Create in-memory storage for testing/development.
    ///
    /// Buckets always exist and neither can sign, so private uploads fail.
    pub fn in_memory(endpoint: &str) -> Result<Self> {
        let in_memory = |name: &str| Bucket {
            name: name.to_string(),
            store: Arc::new(object_store::memory::InMemory::new()),
            signer: None,
        };

        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            public: in_memory("minls-public"),
            private: in_memory("minls-private"),
            provisioner: None,
            presign_expiry: Duration::from_secs(7 * 24 * 60 * 60),
        })
    }

    fn bucket(&self, visibility: Visibility) -> &Bucket {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Private => &self.private,
        }
    }

    /// Upload a local file under a random name and return its link
    pub async fn upload_file(&self, path: &Path, visibility: Visibility) -> Result<String> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| StorageError::ReadFile {
                path: path.to_path_buf(),
                source,
            })?;

        let key = randomized_key(path);
        let content_type = content_type_for(path, &data);

        tracing::debug!(
            path = %path.display(),
            key = %key,
            content_type = %content_type,
            "Prepared upload"
        );

        self.upload(&key, Bytes::from(data), &content_type, visibility)
            .await
    }

    /// Upload bytes to storage, creating the bucket when needed
    pub async fn upload(
        &self,
        key: &str,
        data: Bytes,
        content_type: &Mime,
        visibility: Visibility,
    ) -> Result<String> {
        let bucket = self.bucket(visibility);
        if let Some(provisioner) = &self.provisioner {
            provisioner.ensure(&bucket.name, visibility).await?;
        }

        let path = StoragePath::from(key);
        let size = data.len();

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let put_result = bucket.store.put_opts(&path, data.into(), options).await?;

        tracing::info!(
            bucket = %bucket.name,
            key,
            size,
            etag = ?put_result.e_tag,
            "Uploaded to storage"
        );

        match visibility {
            Visibility::Public => Ok(self.public_link(&bucket.name, key)),
            Visibility::Private => self.presigned_link(bucket, &path).await,
        }
    }

    fn public_link(&self, bucket: &str, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.as_str().trim_end_matches('/'),
            bucket,
            key
        )
    }

    async fn presigned_link(&self, bucket: &Bucket, path: &StoragePath) -> Result<String> {
        let signer = bucket
            .signer
            .as_ref()
            .ok_or_else(|| StorageError::SigningUnavailable(bucket.name.clone()))?;

        let url = signer
            .signed_url(reqwest::Method::GET, path, self.presign_expiry)
            .await?;

        tracing::debug!(bucket = %bucket.name, expiry = ?self.presign_expiry, "Presigned link created");
        Ok(url.to_string())
    }
}

fn s3_bucket(config: &StorageConfig, endpoint: &Url, name: &str) -> Result<Bucket> {
    let mut builder = AmazonS3Builder::new()
        .with_endpoint(endpoint.as_str().trim_end_matches('/'))
        .with_region(&config.region)
        .with_bucket_name(name)
        .with_allow_http(endpoint.scheme() == "http")
        .with_virtual_hosted_style_request(false);

    if let Some(access_key) = &config.access_key {
        builder = builder.with_access_key_id(access_key);
    }
    if let Some(secret_key) = &config.secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }

    let s3 = Arc::new(builder.build()?);

    Ok(Bucket {
        name: name.to_string(),
        store: s3.clone(),
        signer: Some(s3),
    })
}

/// Parse a MinIO endpoint, defaulting to plain HTTP when no scheme is given
fn parse_endpoint(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StorageError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: "endpoint is empty".to_string(),
        });
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{}", raw)
    };

    let url = Url::parse(&with_scheme).map_err(|e| StorageError::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: e.to_string(),
    })?;

    if url.host_str().is_none() {
        return Err(StorageError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(url)
}

/// `<uuid-v4><original extension>`
fn randomized_key(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default();

    format!("{}{}", Uuid::new_v4(), ext)
}

/// Content type sniffed from the file's leading bytes, else guessed from
/// its extension
pub fn content_type_for(path: &Path, data: &[u8]) -> Mime {
    if let Some(kind) = infer::get(data) {
        match kind.mime_type().parse() {
            Ok(sniffed) => return sniffed,
            Err(e) => tracing::debug!(mime = kind.mime_type(), error = %e, "Unusable sniffed type"),
        }
    }

    mime_guess::from_path(path).first_or_octet_stream()
}
