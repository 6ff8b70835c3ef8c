//! HTTP client for the YOURLS link shortener

use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ShortenerConfig;

const API_PATH: &str = "/yourls-api.php";

#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("Shortener endpoint is not configured")]
    MissingEndpoint,

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Response did not contain a short URL: {0}")]
    MissingShortUrl(String),
}

pub type Result<T> = std::result::Result<T, ShortenError>;

/// Subset of the `shorturl` action response we rely on
#[derive(Debug, Clone, Deserialize)]
pub struct ShortenResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub shorturl: Option<String>,
}

/// YOURLS API client
pub struct ShortenerClient {
    client: Client,
    endpoint: String,
    signature: String,
    title: String,
}

impl ShortenerClient {
    pub fn new(config: &ShortenerConfig) -> Result<Self> {
        let raw = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or(ShortenError::MissingEndpoint)?;

        let client = Client::builder()
            .timeout(config.timeout.as_duration())
            .user_agent(concat!("minls/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: normalize_endpoint(raw),
            signature: config.signature.clone().unwrap_or_default(),
            title: config.title.clone(),
        })
    }

    /// Shorten `long_url` under a random keyword
    pub async fn shorten(&self, long_url: &str) -> Result<String> {
        let keyword = Uuid::new_v4().to_string();
        let form = [
            ("signature", self.signature.as_str()),
            ("action", "shorturl"),
            ("format", "json"),
            ("url", long_url),
            ("title", self.title.as_str()),
            ("keyword", keyword.as_str()),
        ];

        debug!(endpoint = %self.endpoint, keyword = %keyword, "Requesting short URL");

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, mime::APPLICATION_JSON.as_ref())
            .form(&form[..])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(ShortenError::Status { status, body });
        }

        let parsed: ShortenResponse = response.json().await?;
        debug!(status = ?parsed.status, message = ?parsed.message, "Shortener responded");

        match parsed.shorturl {
            Some(short) if !short.is_empty() => Ok(short),
            _ => Err(ShortenError::MissingShortUrl(
                parsed.message.unwrap_or_else(|| "no message".to_string()),
            )),
        }
    }
}

/// Add a scheme when missing and warn about setups that usually are mistakes
fn normalize_endpoint(raw: &str) -> String {
    let raw = raw.trim();
    let endpoint = if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        let with_scheme = format!("http://{}", raw);
        warn!(endpoint = %with_scheme, "Shortener endpoint had no scheme, assuming http");
        with_scheme
    };

    if !endpoint.starts_with("https://") {
        warn!(endpoint = %endpoint, "Shortener endpoint is not using TLS");
    }

    if !endpoint.contains(API_PATH) {
        warn!(endpoint = %endpoint, "Shortener endpoint may be missing {}", API_PATH);
    }

    endpoint
}
