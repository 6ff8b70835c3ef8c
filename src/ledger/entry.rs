//! Upload records and the rules they must satisfy before entering the ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use super::error::{LinkField, ValidationError};

/// One completed upload.
///
/// Field names on disk are `minio_link` / `yourls_link` so files written by
/// earlier versions of the tool keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "minio_link")]
    pub object_link: String,
    #[serde(rename = "yourls_link")]
    pub short_link: String,
}

/// The full persisted collection of entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub entries: Vec<Entry>,
    /// Highest id ever handed out, including ids of evicted entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<u64>,
}

impl Ledger {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Highest id known to this ledger, 0 when nothing was ever written.
    ///
    /// Duplicate ids in a hand-edited file are not rejected; the maximum wins.
    pub fn latest_id(&self) -> u64 {
        let from_entries = self.entries.iter().map(|e| e.id).max().unwrap_or(0);
        from_entries.max(self.last_id.unwrap_or(0))
    }
}

// `{"entries": null}` is what an empty ledger looked like on disk before.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Entry>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Entry>>::deserialize(deserializer)?.unwrap_or_default())
}

/// An entry as handed in by a caller.
///
/// `id == 0` and `timestamp == None` mean "assign defaults".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub id: u64,
    pub timestamp: Option<DateTime<Utc>>,
    pub object_link: String,
    pub short_link: String,
}

impl EntryDraft {
    pub fn new(object_link: impl Into<String>, short_link: impl Into<String>) -> Self {
        Self {
            id: 0,
            timestamp: None,
            object_link: object_link.into(),
            short_link: short_link.into(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Fill in defaults and check both links against `ledger`
    pub fn validate(self, ledger: &Ledger) -> Result<Entry, ValidationError> {
        let id = if self.id == 0 {
            let latest = ledger.latest_id();
            latest
                .checked_add(1)
                .ok_or(ValidationError::IdExhausted(latest))?
        } else {
            self.id
        };

        let timestamp = self.timestamp.unwrap_or_else(Utc::now);

        check_link(LinkField::ObjectLink, &self.object_link)?;
        check_link(LinkField::ShortLink, &self.short_link)?;

        Ok(Entry {
            id,
            timestamp,
            object_link: self.object_link,
            short_link: self.short_link,
        })
    }
}

fn check_link(field: LinkField, value: &str) -> Result<(), ValidationError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|source| ValidationError::MalformedLink {
            field,
            value: value.to_string(),
            source,
        })
}
