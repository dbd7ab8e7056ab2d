// Endpoint defaults
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

// Remote routes
pub const FILES_ROUTE: &str = "files";
pub const UPLOAD_ROUTE: &str = "upload";
pub const UPLOAD_FIELD: &str = "file";

// Local side
pub const DEFAULT_DOWNLOAD_DIR: &str = ".";
// In-progress downloads live here until complete
pub const PARTIAL_DIR: &str = ".fileshelf-partial";

// Upper bound on buffer preallocation from a server-supplied length
pub const MAX_PREALLOCATE: u64 = 8 << 20;

// How many names a confirmation prompt shows before summarising
pub const CONFIRM_PREVIEW_LIMIT: usize = 5;
