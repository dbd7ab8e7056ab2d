// Status mapping and the wrapping macro for transfer errors
use crate::error::{NetworkUnreachableSnafu, TransferError};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use snafu::ResultExt;

/// Convert transport-level errors into a [`TransferError`].
pub trait IntoTransferError {
    fn into_transfer_error(self) -> TransferError;
}

impl IntoTransferError for TransferError {
    fn into_transfer_error(self) -> TransferError {
        self
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Pass successful responses through; map everything else to a [`TransferError`].
///
/// `name` is the file the request addressed. A 404 only means `NotFound` when
/// there is a file to not find.
pub async fn check_status(
    response: Response,
    name: Option<&str>,
) -> Result<Response, TransferError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if let (StatusCode::NOT_FOUND, Some(name)) = (status, name) {
        return Err(TransferError::NotFound {
            name: name.to_string(),
        });
    }

    let body = response.text().await.context(NetworkUnreachableSnafu)?;
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.detail)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        });

    Err(TransferError::ServerRejected {
        status: status.as_u16(),
        detail,
    })
}

/// Macro to wrap a transfer result into an Error variant with `source: TransferError`.
/// Example:
/// wrap_err!(storage.remove(name).await, OperationFailed { kind: OperationKind::Delete, name: name.to_string() })?
#[macro_export]
macro_rules! wrap_err {
    ($expr:expr, $variant:ident { $($field:ident : $value:expr),* $(,)? }) => {{
        $expr.map_err(|e| {
            let src: $crate::error::TransferError =
                $crate::storage::utils::error::IntoTransferError::into_transfer_error(e);
            $crate::error::Error::$variant { $($field: $value,)* source: src }
        })
    }};
}
