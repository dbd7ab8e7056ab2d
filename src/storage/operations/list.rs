use crate::error::{MalformedResponseSnafu, NetworkUnreachableSnafu, TransferError};
use crate::storage::StorageClient;
use crate::storage::types::{FileEntry, ListResponse};
use crate::storage::utils::error::check_status;
use snafu::ResultExt;

/// Trait for reading the authoritative file list.
pub trait Lister {
    /// Fetch every file the service currently holds.
    ///
    /// Idempotent; calling it again is the only way to observe mutations.
    async fn list(&self) -> Result<Vec<FileEntry>, TransferError>;
}

impl Lister for StorageClient {
    async fn list(&self) -> Result<Vec<FileEntry>, TransferError> {
        let url = self.route(&[crate::storage::constants::FILES_ROUTE]);
        log::debug!("list url={url}");

        let response = self
            .http()
            .get(url)
            .send()
            .await
            .context(NetworkUnreachableSnafu)?;
        let response = check_status(response, None).await?;
        let body = response.text().await.context(NetworkUnreachableSnafu)?;
        let listing: ListResponse =
            serde_json::from_str(&body).context(MalformedResponseSnafu)?;

        let entries = listing.into_entries();
        log::debug!("list returned {} entries", entries.len());
        Ok(entries)
    }
}
