use snafu::Snafu;
use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The kind of transfer an operation performs against the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Upload,
    Download,
    Delete,
    Clear,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            OperationKind::Upload => "upload",
            OperationKind::Download => "download",
            OperationKind::Delete => "delete",
            OperationKind::Clear => "clear",
        };
        f.write_str(verb)
    }
}

/// Why the tracker refused to start an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusyReason {
    /// `begin_upload` was called with no pending selection.
    NothingSelected,
    /// Only one upload may be in flight.
    UploadInFlight,
    /// The file already has an active operation of this kind.
    Active(OperationKind),
    /// Everything is being deleted.
    ClearInFlight,
    /// A clear cannot start while other operations are active.
    OperationsInFlight(usize),
}

impl fmt::Display for BusyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusyReason::NothingSelected => write!(f, "no file is selected for upload"),
            BusyReason::UploadInFlight => write!(f, "an upload is already in progress"),
            BusyReason::Active(kind) => write!(f, "a {kind} is already in progress"),
            BusyReason::ClearInFlight => write!(f, "all files are being deleted"),
            BusyReason::OperationsInFlight(count) => {
                write!(f, "{count} operation(s) still in progress")
            }
        }
    }
}

/// Outcome of a request that reached (or tried to reach) the remote service.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum TransferError {
    #[snafu(display("'{name}' was not found on the server"))]
    NotFound { name: String },

    #[snafu(display(
        "server rejected the request with status {status}{}",
        detail.as_deref().map(|d| format!(" ({d})")).unwrap_or_default()
    ))]
    ServerRejected { status: u16, detail: Option<String> },

    #[snafu(display("network unreachable: {source}"))]
    NetworkUnreachable { source: reqwest::Error },

    #[snafu(display("malformed response from server: {source}"))]
    MalformedResponse { source: serde_json::Error },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid value '{value}' for {key}"))]
    InvalidConfig { key: String, value: String },

    #[snafu(display("Invalid storage endpoint '{endpoint}': {reason}"))]
    InvalidEndpoint { endpoint: String, reason: String },

    #[snafu(display("Cannot start operation on {key}: {reason}"))]
    Busy { key: String, reason: BusyReason },

    #[snafu(display("Failed to {kind} '{name}': {source}"))]
    OperationFailed {
        kind: OperationKind,
        name: String,
        source: TransferError,
    },

    #[snafu(display("Failed to list files: {source}"))]
    ListFailed { source: TransferError },

    #[snafu(display("Failed to save '{name}': {source}"))]
    SaveFailed {
        name: String,
        source: opendal::Error,
    },

    #[snafu(display("Failed to read '{}': {source}", path.display()))]
    ReadSelectionFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Path does not exist: {}", path.display()))]
    PathNotFound { path: PathBuf },

    #[snafu(display("Not a regular file: {}", path.display()))]
    NotAFile { path: PathBuf },

    #[snafu(display("Invalid file name: '{name}'"))]
    InvalidName { name: String },

    #[snafu(display("Failed to {kind} {} file(s): {}", failed_names.len(), failed_names.join(", ")))]
    PartialFailure {
        kind: OperationKind,
        failed_names: Vec<String>,
    },

    #[snafu(display("Failed to build HTTP client: {source}"))]
    HttpClient { source: reqwest::Error },

    #[snafu(display("OpenDAL error: {source}"))]
    OpenDal { source: opendal::Error },

    #[snafu(display("Failed to encode output: {source}"))]
    EncodeOutput { source: serde_json::Error },

    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },
}

impl Error {
    pub fn is_busy(&self) -> bool {
        matches!(self, Error::Busy { .. })
    }

    /// The network outcome behind this error, if any.
    pub fn transfer_error(&self) -> Option<&TransferError> {
        match self {
            Error::OperationFailed { source, .. } | Error::ListFailed { source } => Some(source),
            _ => None,
        }
    }
}

impl From<opendal::Error> for Error {
    fn from(error: opendal::Error) -> Self {
        Error::OpenDal { source: error }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::Io { source: error }
    }
}
