// Delete operation trait and implementation
use crate::error::{NetworkUnreachableSnafu, TransferError};
use crate::storage::StorageClient;
use crate::storage::constants::FILES_ROUTE;
use crate::storage::utils::error::check_status;
use snafu::ResultExt;

/// Trait for deleting files from storage.
pub trait Deleter {
    /// Delete a single file.
    ///
    /// Not retried. Deleting a name that is already gone is whatever the
    /// server says it is.
    async fn remove(&self, name: &str) -> Result<(), TransferError>;

    /// Delete every file the service holds.
    async fn remove_all(&self) -> Result<(), TransferError>;
}

impl Deleter for StorageClient {
    async fn remove(&self, name: &str) -> Result<(), TransferError> {
        let url = self.route(&[FILES_ROUTE, name]);
        log::debug!("remove url={url}");

        let response = self
            .http()
            .delete(url)
            .send()
            .await
            .context(NetworkUnreachableSnafu)?;
        check_status(response, Some(name)).await?;
        Ok(())
    }

    async fn remove_all(&self) -> Result<(), TransferError> {
        let url = self.route(&[FILES_ROUTE]);
        log::debug!("remove_all url={url}");

        let response = self
            .http()
            .delete(url)
            .send()
            .await
            .context(NetworkUnreachableSnafu)?;
        check_status(response, None).await?;
        Ok(())
    }
}
