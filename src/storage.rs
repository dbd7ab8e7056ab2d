use crate::config::ClientConfig;
use crate::error::{Error, HttpClientSnafu, Result};
use reqwest::{Client, Url};
use snafu::ResultExt;

pub mod constants;
mod operations;
pub mod types;
pub mod utils;

pub use self::operations::{Deleter, Downloader, Lister, Uploader};
pub use self::types::{ByteStream, FileEntry};

/// Everything a caller needs from the remote service.
///
/// Implemented automatically for any type that provides the four operations.
pub trait RemoteStorage: Lister + Uploader + Downloader + Deleter {}

impl<T> RemoteStorage for T where T: Lister + Uploader + Downloader + Deleter {}

/// HTTP client for the file storage service. Holds no per-file state.
#[derive(Debug, Clone)]
pub struct StorageClient {
    http: Client,
    endpoint: Url,
}

impl StorageClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = parse_endpoint(&config.endpoint)?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context(HttpClientSnafu)?;

        log::debug!("storage client endpoint={endpoint} timeout={:?}", config.timeout);
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Build a URL under the endpoint. Each segment is percent-encoded as a
    /// single path segment, so names with `/`, `#` or spaces stay intact.
    pub(crate) fn route(&self, segments: &[&str]) -> Url {
        let mut url = self.endpoint.clone();
        // parse_endpoint rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| Error::InvalidEndpoint {
        endpoint: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(invalid("scheme must be http or https")),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("not a base URL"));
    }
    Ok(url)
}
