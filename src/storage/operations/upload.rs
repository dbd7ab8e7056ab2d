use crate::error::{NetworkUnreachableSnafu, TransferError};
use crate::storage::StorageClient;
use crate::storage::constants::{UPLOAD_FIELD, UPLOAD_ROUTE};
use crate::storage::utils::error::check_status;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use snafu::ResultExt;

/// Trait for sending a new file to storage.
pub trait Uploader {
    /// Upload `bytes` under `name` as a multipart `file` field.
    ///
    /// At most once: a failed upload is reported, never retried. What the
    /// server does with a name that already exists is up to the server.
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<(), TransferError>;
}

#[derive(Deserialize)]
struct UploadResponse {
    filename: Option<String>,
}

impl Uploader for StorageClient {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> Result<(), TransferError> {
        let url = self.route(&[UPLOAD_ROUTE]);
        log::debug!("upload url={url} name={name} bytes={}", bytes.len());

        let part = Part::bytes(bytes).file_name(name.to_string());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .http()
            .post(url)
            .multipart(form)
            .send()
            .await
            .context(NetworkUnreachableSnafu)?;
        let response = check_status(response, None).await?;

        // The body is informational only.
        if let Ok(body) = response.text().await {
            if let Ok(UploadResponse {
                filename: Some(stored),
            }) = serde_json::from_str(&body)
            {
                log::debug!("upload stored name={stored}");
            }
        }
        Ok(())
    }
}
