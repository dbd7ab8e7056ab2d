use crate::error::{NetworkUnreachableSnafu, TransferError};
use crate::storage::StorageClient;
use crate::storage::constants::FILES_ROUTE;
use crate::storage::types::ByteStream;
use crate::storage::utils::error::check_status;
use futures::stream::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use snafu::ResultExt;

/// Trait for retrieving a file's contents from storage.
pub trait Downloader {
    /// Open the body of `name` as a chunked stream.
    ///
    /// # Returns
    /// * `NotFound` if the name no longer exists server-side
    async fn fetch_bytes(&self, name: &str) -> Result<ByteStream, TransferError>;
}

impl Downloader for StorageClient {
    async fn fetch_bytes(&self, name: &str) -> Result<ByteStream, TransferError> {
        let url = self.route(&[FILES_ROUTE, name]);
        log::debug!("fetch_bytes url={url}");

        let response = self
            .http()
            .get(url)
            .send()
            .await
            .context(NetworkUnreachableSnafu)?;
        let response = check_status(response, Some(name)).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map_ok(|chunk| chunk.to_vec())
            .map_err(|source| TransferError::NetworkUnreachable { source })
            .boxed();

        Ok(ByteStream::new(content_type, content_length, body))
    }
}
