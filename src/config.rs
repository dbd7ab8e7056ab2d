use crate::error::{Error, Result};
use crate::storage::constants::{DEFAULT_DOWNLOAD_DIR, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Client configuration for talking to the storage service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the storage service.
    pub endpoint: String,
    /// Transport timeout for a whole request; `None` waits forever.
    pub timeout: Option<Duration>,
    /// Where downloaded files are saved.
    pub download_dir: PathBuf,
    /// Re-fetch the listing after a successful upload or delete.
    pub auto_refresh: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            auto_refresh: false,
        }
    }
}

/// Load client configuration from environment variables
pub fn load_client_config() -> Result<ClientConfig> {
    load_config_from(|key| env::var(key).ok())
}

/// Load client configuration through an arbitrary variable lookup.
pub fn load_config_from<F>(lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::default();

    if let Some(endpoint) = lookup("FILESHELF_ENDPOINT").or_else(|| lookup("STORAGE_ENDPOINT")) {
        config.endpoint = endpoint;
    }

    if let Some(raw) = lookup("FILESHELF_TIMEOUT_SECS") {
        let secs: u64 = raw.trim().parse().map_err(|_| Error::InvalidConfig {
            key: "FILESHELF_TIMEOUT_SECS".to_string(),
            value: raw.clone(),
        })?;
        config.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    if let Some(dir) = lookup("FILESHELF_DOWNLOAD_DIR") {
        config.download_dir = PathBuf::from(dir);
    }

    if let Some(raw) = lookup("FILESHELF_AUTO_REFRESH") {
        config.auto_refresh = parse_flag(&raw).ok_or_else(|| Error::InvalidConfig {
            key: "FILESHELF_AUTO_REFRESH".to_string(),
            value: raw.clone(),
        })?;
    }

    Ok(config)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
