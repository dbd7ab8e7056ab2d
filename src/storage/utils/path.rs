// Name helpers shared by the client and the local save target
use std::path::Path;

/// Extract a normalized basename from a remote name.
pub fn basename(name: &str) -> String {
    Path::new(name.trim_start_matches('/'))
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.trim_matches('/').to_string())
}

/// Name a downloaded file may be written under locally.
///
/// Separators are stripped so a server-supplied name can never escape the
/// download directory.
pub fn local_file_name(name: &str) -> Option<String> {
    let base = basename(&name.replace('\\', "/"));
    match base.as_str() {
        "" | "." | ".." => None,
        _ if base.contains('/') => None,
        _ => Some(base),
    }
}
