//! Per-file operation state.
//!
//! The tracker is the single owner of "what is running right now". Every
//! `begin_*` either rejects immediately with [`Error::Busy`] or hands back an
//! [`OperationTicket`] that owns the slot until it is dropped. There is no
//! queue: a conflicting request is refused, never buffered.

use crate::error::{BusyReason, BusySnafu, Error, OperationKind, Result};
use snafu::ensure;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const UPLOAD_KEY: &str = "upload";
const CLEAR_KEY: &str = "all files";

/// A local file staged for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSelection {
    path: PathBuf,
    name: String,
}

impl PendingSelection {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Stage `path` under its own file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::InvalidName {
                name: path.display().to_string(),
            })?;
        Ok(Self { path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name the file will be uploaded under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationState {
    Idle,
    Uploading(PendingSelection),
    Downloading(String),
    Deleting(String),
}

impl OperationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, OperationState::Idle)
    }

    pub fn kind(&self) -> Option<OperationKind> {
        match self {
            OperationState::Idle => None,
            OperationState::Uploading(_) => Some(OperationKind::Upload),
            OperationState::Downloading(_) => Some(OperationKind::Download),
            OperationState::Deleting(_) => Some(OperationKind::Delete),
        }
    }
}

#[derive(Debug, Default)]
struct Slots {
    pending: Option<PendingSelection>,
    upload: Option<PendingSelection>,
    // Only Download and Delete ever live here.
    files: HashMap<String, OperationKind>,
    clearing: bool,
}

impl Slots {
    fn active_count(&self) -> usize {
        self.files.len() + usize::from(self.upload.is_some())
    }

    fn ensure_not_clearing(&self, key: &str) -> Result<()> {
        ensure!(
            !self.clearing,
            BusySnafu {
                key,
                reason: BusyReason::ClearInFlight
            }
        );
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum SlotKey {
    Upload,
    File(String),
    Clear,
}

/// Shared handle to the per-file operation table.
///
/// Cloning is cheap and every clone sees the same state.
#[derive(Debug, Clone, Default)]
pub struct OperationTracker {
    slots: Arc<Mutex<Slots>>,
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stage a local file for upload, replacing any earlier selection.
    pub fn select_pending(&self, selection: PendingSelection) {
        let mut slots = self.lock();
        if let Some(previous) = slots.pending.replace(selection) {
            log::debug!("pending selection replaced previous={}", previous.name());
        }
    }

    pub fn pending(&self) -> Option<PendingSelection> {
        self.lock().pending.clone()
    }

    /// Take the pending selection and mark it as uploading.
    pub fn begin_upload(&self) -> Result<OperationTicket> {
        let mut slots = self.lock();
        slots.ensure_not_clearing(UPLOAD_KEY)?;
        ensure!(
            slots.upload.is_none(),
            BusySnafu {
                key: UPLOAD_KEY,
                reason: BusyReason::UploadInFlight
            }
        );
        let selection = slots.pending.take().ok_or_else(|| Error::Busy {
            key: UPLOAD_KEY.to_string(),
            reason: BusyReason::NothingSelected,
        })?;
        log::debug!("begin upload name={}", selection.name());
        slots.upload = Some(selection.clone());
        drop(slots);

        Ok(self.ticket(SlotKey::Upload, OperationState::Uploading(selection)))
    }

    pub fn begin_download(&self, name: &str) -> Result<OperationTicket> {
        self.begin_file(name, OperationKind::Download)
    }

    /// Confirmation is the caller's job; the tracker only guards the slot.
    pub fn begin_delete(&self, name: &str) -> Result<OperationTicket> {
        self.begin_file(name, OperationKind::Delete)
    }

    fn begin_file(&self, name: &str, kind: OperationKind) -> Result<OperationTicket> {
        let mut slots = self.lock();
        slots.ensure_not_clearing(name)?;
        if let Some(active) = slots.files.get(name) {
            return BusySnafu {
                key: name,
                reason: BusyReason::Active(*active),
            }
            .fail();
        }
        log::debug!("begin {kind} name={name}");
        slots.files.insert(name.to_string(), kind);
        drop(slots);

        let state = match kind {
            OperationKind::Download => OperationState::Downloading(name.to_string()),
            _ => OperationState::Deleting(name.to_string()),
        };
        Ok(self.ticket(SlotKey::File(name.to_string()), state))
    }

    /// Reserve the whole table for a delete-everything request.
    pub fn begin_clear(&self) -> Result<OperationTicket> {
        let mut slots = self.lock();
        slots.ensure_not_clearing(CLEAR_KEY)?;
        let active = slots.active_count();
        ensure!(
            active == 0,
            BusySnafu {
                key: CLEAR_KEY,
                reason: BusyReason::OperationsInFlight(active)
            }
        );
        log::debug!("begin clear");
        slots.clearing = true;
        drop(slots);

        Ok(self.ticket(SlotKey::Clear, OperationState::Idle))
    }

    fn ticket(&self, key: SlotKey, state: OperationState) -> OperationTicket {
        OperationTicket {
            slots: Arc::clone(&self.slots),
            key,
            state,
        }
    }

    pub fn status_of(&self, name: &str) -> OperationState {
        let slots = self.lock();
        if slots.clearing {
            return OperationState::Deleting(name.to_string());
        }
        match slots.files.get(name) {
            Some(OperationKind::Download) => OperationState::Downloading(name.to_string()),
            Some(_) => OperationState::Deleting(name.to_string()),
            None => match &slots.upload {
                Some(selection) if selection.name() == name => {
                    OperationState::Uploading(selection.clone())
                }
                _ => OperationState::Idle,
            },
        }
    }

    /// State of the single upload slot.
    pub fn upload_state(&self) -> OperationState {
        match &self.lock().upload {
            Some(selection) => OperationState::Uploading(selection.clone()),
            None => OperationState::Idle,
        }
    }

    pub fn is_clearing(&self) -> bool {
        self.lock().clearing
    }

    /// Every non-idle operation, sorted by key.
    pub fn active(&self) -> Vec<OperationState> {
        let slots = self.lock();
        let mut states: Vec<OperationState> = slots
            .files
            .iter()
            .map(|(name, kind)| match kind {
                OperationKind::Download => OperationState::Downloading(name.clone()),
                _ => OperationState::Deleting(name.clone()),
            })
            .collect();
        if let Some(selection) = &slots.upload {
            states.push(OperationState::Uploading(selection.clone()));
        }
        states.sort_by(|a, b| state_key(a).cmp(state_key(b)));
        states
    }
}

fn state_key(state: &OperationState) -> &str {
    match state {
        OperationState::Idle => "",
        OperationState::Uploading(selection) => selection.name(),
        OperationState::Downloading(name) | OperationState::Deleting(name) => name,
    }
}

/// Proof that an operation owns its slot.
///
/// The slot is released when the ticket is dropped, so every exit path
/// (success, error, panic or a cancelled future) settles the operation.
#[must_use = "dropping the ticket settles the operation immediately"]
#[derive(Debug)]
pub struct OperationTicket {
    slots: Arc<Mutex<Slots>>,
    key: SlotKey,
    state: OperationState,
}

impl OperationTicket {
    /// The state this operation holds while in flight.
    pub fn state(&self) -> &OperationState {
        &self.state
    }

    /// The selection being uploaded, for upload tickets.
    pub fn selection(&self) -> Option<&PendingSelection> {
        match &self.state {
            OperationState::Uploading(selection) => Some(selection),
            _ => None,
        }
    }

    pub fn settle(self) {}
}

impl Drop for OperationTicket {
    fn drop(&mut self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match &self.key {
            SlotKey::Upload => {
                slots.upload = None;
            }
            SlotKey::File(name) => {
                slots.files.remove(name);
            }
            SlotKey::Clear => {
                slots.clearing = false;
            }
        }
        log::debug!("settled {:?}", self.key);
    }
}
