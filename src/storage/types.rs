use crate::error::TransferError;
use crate::storage::constants::MAX_PREALLOCATE;
use chrono::{DateTime, NaiveDateTime, Utc};
use futures::stream::{BoxStream, Stream, StreamExt};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// One file held by the remote service, as reported by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    uploaded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
}

impl FileEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uploaded_at: None,
            content_type: None,
        }
    }

    pub fn with_uploaded_at(mut self, uploaded_at: DateTime<Utc>) -> Self {
        self.uploaded_at = Some(uploaded_at);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        self.uploaded_at
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// A listing entry is either a bare name or a record; which one is decided by
/// the shape of the JSON value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    Name(String),
    Record {
        name: String,
        #[serde(
            default,
            rename = "uploadedAt",
            alias = "uploaded_at",
            deserialize_with = "lenient_timestamp"
        )]
        uploaded_at: Option<DateTime<Utc>>,
        #[serde(default, rename = "contentType", alias = "content_type")]
        content_type: Option<String>,
    },
}

impl From<RawEntry> for FileEntry {
    fn from(raw: RawEntry) -> Self {
        match raw {
            RawEntry::Name(name) => FileEntry::new(name),
            RawEntry::Record {
                name,
                uploaded_at,
                content_type,
            } => FileEntry {
                name,
                uploaded_at,
                content_type,
            },
        }
    }
}

/// Body of `GET /files`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse {
    #[serde(default)]
    files: Vec<RawEntry>,
}

impl ListResponse {
    /// Drop unnamed entries and repeated names, keeping the first occurrence.
    pub(crate) fn into_entries(self) -> Vec<FileEntry> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.files.len());
        for entry in self.files.into_iter().map(FileEntry::from) {
            if entry.name.is_empty() {
                log::warn!("skipping listing entry with an empty name");
                continue;
            }
            if !seen.insert(entry.name.clone()) {
                log::warn!("skipping duplicate listing entry name={}", entry.name);
                continue;
            }
            entries.push(entry);
        }
        entries
    }
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| {
        let parsed = parse_timestamp(&value);
        if parsed.is_none() {
            log::warn!("ignoring unparseable upload timestamp value={value}");
        }
        parsed
    }))
}

/// Parse RFC 3339, or a naive ISO-8601 timestamp taken to be UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Body of a download, delivered in chunks as it arrives.
pub struct ByteStream {
    content_type: Option<String>,
    content_length: Option<u64>,
    inner: BoxStream<'static, Result<Vec<u8>, TransferError>>,
}

impl ByteStream {
    pub fn new(
        content_type: Option<String>,
        content_length: Option<u64>,
        inner: BoxStream<'static, Result<Vec<u8>, TransferError>>,
    ) -> Self {
        Self {
            content_type,
            content_length,
            inner,
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let len = bytes.len() as u64;
        Self::new(
            None,
            Some(len),
            futures::stream::once(async move { Ok(bytes) }).boxed(),
        )
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Drain the stream into memory.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>, TransferError> {
        let hint = self.content_length.unwrap_or(0).min(MAX_PREALLOCATE);
        let mut buf = Vec::with_capacity(hint as usize);
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }
}

impl Stream for ByteStream {
    type Item = Result<Vec<u8>, TransferError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
