//! Text rendering of the listing and of in-flight operations.

use crate::manager::Listing;
use crate::storage::FileEntry;
use crate::tracker::{OperationState, OperationTracker};
use std::fmt;
use std::fmt::Write;

pub const EMPTY_LISTING: &str = "No files uploaded yet.";
pub const STALE_BANNER: &str = "(list may be out of date; run `refresh` to update)";

/// Label shown next to a file, mirroring what its controls would show.
pub fn status_label(state: &OperationState) -> &'static str {
    match state {
        OperationState::Idle => "",
        OperationState::Uploading(_) => "Uploading...",
        OperationState::Downloading(_) => "Downloading...",
        OperationState::Deleting(_) => "Deleting...",
    }
}

/// One file with its current operation status.
pub struct FileRow<'a> {
    entry: &'a FileEntry,
    state: OperationState,
}

impl<'a> FileRow<'a> {
    pub fn new(entry: &'a FileEntry, state: OperationState) -> Self {
        Self { entry, state }
    }
}

impl fmt::Display for FileRow<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uploaded = self
            .entry
            .uploaded_at()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let content_type = self.entry.content_type().unwrap_or("-");
        let line = format!(
            "{uploaded:<19} {content_type:<24} {} {}",
            self.entry.name(),
            status_label(&self.state)
        );
        f.write_str(line.trim_end())
    }
}

/// Render the cached listing with per-file status, the upload slot and the
/// stale banner.
pub fn render_listing(listing: &Listing, tracker: &OperationTracker) -> String {
    let mut out = String::new();

    if !listing.fetched {
        out.push_str("File list not loaded yet; run `refresh`.\n");
    } else if listing.files.is_empty() {
        let _ = writeln!(out, "{EMPTY_LISTING}");
    } else {
        for entry in &listing.files {
            let row = FileRow::new(entry, tracker.status_of(entry.name()));
            let _ = writeln!(out, "{row}");
        }
    }

    if listing.stale {
        let _ = writeln!(out, "{STALE_BANNER}");
    }

    match tracker.upload_state() {
        OperationState::Uploading(selection) => {
            let _ = writeln!(out, "Uploading {}...", selection.name());
        }
        _ => {
            if let Some(selection) = tracker.pending() {
                let _ = writeln!(
                    out,
                    "Selected for upload: {} (run `upload`)",
                    selection.name()
                );
            }
        }
    }

    out
}

/// One line per in-flight operation.
pub fn render_status(tracker: &OperationTracker) -> String {
    let active = tracker.active();
    if active.is_empty() && !tracker.is_clearing() {
        return "Idle.\n".to_string();
    }

    let mut out = String::new();
    if tracker.is_clearing() {
        out.push_str("Deleting all files...\n");
    }
    for state in active {
        let name = match &state {
            OperationState::Uploading(selection) => selection.name().to_string(),
            OperationState::Downloading(name) | OperationState::Deleting(name) => name.clone(),
            OperationState::Idle => continue,
        };
        let _ = writeln!(out, "{} {name}", status_label(&state));
    }
    out
}
