//! Request coordination: start an operation through the tracker, perform the
//! network call, settle, and report the outcome.

use crate::error::{
    BusyReason, Error, InvalidNameSnafu, NotAFileSnafu, OperationKind, ReadSelectionFailedSnafu,
    Result,
};
use crate::local::SaveTarget;
use crate::storage::{FileEntry, RemoteStorage};
use crate::tracker::{OperationState, OperationTracker, PendingSelection};
use crate::wrap_err;
use futures::future::join_all;
use snafu::{ResultExt, ensure};
use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::fs;

/// The last fetched file list. Never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub files: Vec<FileEntry>,
    /// A mutation succeeded since this list was fetched.
    pub stale: bool,
    /// Whether any fetch has completed yet.
    pub fetched: bool,
}

/// A successfully settled operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub kind: OperationKind,
    pub name: String,
    /// Local location of a downloaded file.
    pub saved_to: Option<String>,
    /// The listing was re-fetched after the mutation.
    pub list_refreshed: bool,
}

impl Outcome {
    fn needs_refresh(&self) -> bool {
        self.kind != OperationKind::Download && !self.list_refreshed
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            OperationKind::Upload => write!(f, "Uploaded '{}'.", self.name)?,
            OperationKind::Download => match &self.saved_to {
                Some(location) => write!(f, "Downloaded '{}' to {location}.", self.name)?,
                None => write!(f, "Downloaded '{}'.", self.name)?,
            },
            OperationKind::Delete => write!(f, "Deleted '{}'.", self.name)?,
            OperationKind::Clear => write!(f, "Deleted all files.")?,
        }
        if self.needs_refresh() {
            write!(f, " Refresh to see the updated list.")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ListingState {
    listing: Listing,
    // Successful mutations so far.
    mutations: u64,
    // Sequence numbers of refresh requests, issued and applied.
    issued: u64,
    applied: u64,
}

/// Coordinates user actions against the remote service.
pub struct FileManager<S, L> {
    storage: S,
    saver: L,
    tracker: OperationTracker,
    state: Mutex<ListingState>,
    auto_refresh: bool,
}

impl<S, L> FileManager<S, L>
where
    S: RemoteStorage,
    L: SaveTarget,
{
    pub fn new(storage: S, saver: L) -> Self {
        Self {
            storage,
            saver,
            tracker: OperationTracker::new(),
            state: Mutex::new(ListingState::default()),
            auto_refresh: false,
        }
    }

    /// Re-fetch the list after every successful mutation instead of marking it stale.
    pub fn with_auto_refresh(mut self, auto_refresh: bool) -> Self {
        self.auto_refresh = auto_refresh;
        self
    }

    pub fn tracker(&self) -> &OperationTracker {
        &self.tracker
    }

    fn lock_state(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn listing(&self) -> Listing {
        self.lock_state().listing.clone()
    }

    pub fn status_of(&self, name: &str) -> OperationState {
        self.tracker.status_of(name)
    }

    /// Fetch the authoritative list and replace the cached one wholesale.
    ///
    /// A response that arrives after a newer refresh has been applied is
    /// returned to the caller but not cached. A response requested before a
    /// mutation settled leaves the listing marked stale.
    pub async fn refresh(&self) -> Result<Vec<FileEntry>> {
        let (seq, mutations) = {
            let mut state = self.lock_state();
            state.issued += 1;
            (state.issued, state.mutations)
        };

        let files = wrap_err!(self.storage.list().await, ListFailed {})?;

        let mut state = self.lock_state();
        if seq > state.applied {
            state.applied = seq;
            state.listing = Listing {
                files: files.clone(),
                stale: state.mutations != mutations,
                fetched: true,
            };
        } else {
            log::debug!("discarding out-of-order listing seq={seq}");
        }
        Ok(files)
    }

    /// Stage a local file for upload. Replaces any earlier selection.
    pub async fn select(&self, path: impl AsRef<Path>) -> Result<PendingSelection> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).await.map_err(|_| Error::PathNotFound {
            path: path.to_path_buf(),
        })?;
        ensure!(
            metadata.is_file(),
            NotAFileSnafu {
                path: path.to_path_buf()
            }
        );

        let selection = PendingSelection::from_path(path)?;
        self.tracker.select_pending(selection.clone());
        Ok(selection)
    }

    /// Upload the pending selection.
    pub async fn upload(&self) -> Result<Outcome> {
        let ticket = self.tracker.begin_upload()?;
        let selection = ticket.selection().cloned().ok_or_else(|| Error::Busy {
            key: OperationKind::Upload.to_string(),
            reason: BusyReason::NothingSelected,
        })?;
        let name = selection.name().to_string();

        let bytes = fs::read(selection.path())
            .await
            .context(ReadSelectionFailedSnafu {
                path: selection.path().to_path_buf(),
            })?;
        wrap_err!(
            self.storage.upload(bytes, &name).await,
            OperationFailed {
                kind: OperationKind::Upload,
                name: name.clone()
            }
        )?;
        ticket.settle();
        log::info!("uploaded name={name}");

        Ok(self.after_mutation(OperationKind::Upload, name).await)
    }

    /// Download `name` and hand its bytes to the save target. Never refreshes.
    pub async fn download(&self, name: &str) -> Result<Outcome> {
        ensure_name(name)?;
        let ticket = self.tracker.begin_download(name)?;

        let body = wrap_err!(
            self.storage.fetch_bytes(name).await,
            OperationFailed {
                kind: OperationKind::Download,
                name: name.to_string()
            }
        )?;
        let saved_to = self.saver.save(name, body).await?;
        ticket.settle();
        log::info!("downloaded name={name}");

        Ok(Outcome {
            kind: OperationKind::Download,
            name: name.to_string(),
            saved_to: Some(saved_to),
            list_refreshed: false,
        })
    }

    /// Delete `name`. The caller is responsible for confirming first.
    pub async fn delete(&self, name: &str) -> Result<Outcome> {
        ensure_name(name)?;
        let ticket = self.tracker.begin_delete(name)?;

        wrap_err!(
            self.storage.remove(name).await,
            OperationFailed {
                kind: OperationKind::Delete,
                name: name.to_string()
            }
        )?;
        ticket.settle();
        log::info!("deleted name={name}");

        Ok(self.after_mutation(OperationKind::Delete, name.to_string()).await)
    }

    /// Delete every file on the server. The caller is responsible for confirming first.
    pub async fn clear(&self) -> Result<Outcome> {
        let ticket = self.tracker.begin_clear()?;

        wrap_err!(
            self.storage.remove_all().await,
            OperationFailed {
                kind: OperationKind::Clear,
                name: "all files".to_string()
            }
        )?;
        ticket.settle();
        log::info!("cleared all files");

        Ok(self.after_mutation(OperationKind::Clear, String::new()).await)
    }

    /// Download several files at once; each name is tracked independently.
    pub async fn download_many(&self, names: &[String]) -> Vec<Result<Outcome>> {
        join_all(names.iter().map(|name| self.download(name))).await
    }

    pub async fn delete_many(&self, names: &[String]) -> Vec<Result<Outcome>> {
        join_all(names.iter().map(|name| self.delete(name))).await
    }

    async fn after_mutation(&self, kind: OperationKind, name: String) -> Outcome {
        {
            let mut state = self.lock_state();
            state.mutations += 1;
            state.listing.stale = true;
        }

        let mut list_refreshed = false;
        if self.auto_refresh {
            match self.refresh().await {
                Ok(_) => list_refreshed = !self.lock_state().listing.stale,
                Err(e) => log::warn!("refresh after {kind} failed: {e}"),
            }
        }
        Outcome {
            kind,
            name,
            saved_to: None,
            list_refreshed,
        }
    }
}

fn ensure_name(name: &str) -> Result<()> {
    ensure!(!name.is_empty(), InvalidNameSnafu { name });
    Ok(())
}
