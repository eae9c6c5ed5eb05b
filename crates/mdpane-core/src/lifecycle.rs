//! File lifecycle: new / open / save / save-as / close, with the
//! unsaved-changes gate in front of anything that would drop edits.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{Document, FileError, disk_io};

/// File pickers supplied by the shell. `None` means the user dismissed it.
pub trait FileDialogs {
    fn pick_open(&mut self) -> Option<PathBuf>;
    fn pick_save(&mut self, suggested_name: &str) -> Option<PathBuf>;
}

/// A request that must pass the unsaved-changes gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingAction {
    NewBlank,
    /// Open a file. `None` asks the shell's picker once the gate is passed.
    Open(Option<PathBuf>),
    Exit,
}

/// The user's answer to "Do you want to save your changes?".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateChoice {
    Save,
    Discard,
    Cancel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Clean,
    Dirty,
    PendingConfirmation,
}

/// Where a request ended up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum Flow {
    Completed,
    /// The gate is showing; answer it with [`Controller::resolve`].
    AwaitingConfirmation,
    /// Cancelled by the user, or the save that had to come first did not happen.
    Aborted,
    /// The application may terminate.
    Exit,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub enum Saved {
    Written(PathBuf),
    Cancelled,
}

/// Owns the [`Document`] and every transition of its file identity.
#[derive(Debug, Default)]
pub struct Controller {
    doc: Document,
    pending: Option<PendingAction>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn document(&self) -> &Document {
        &self.doc
    }

    pub const fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub const fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub const fn phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::PendingConfirmation
        } else if self.doc.is_dirty() {
            Phase::Dirty
        } else {
            Phase::Clean
        }
    }

    pub fn new_document(&mut self, dialogs: &mut impl FileDialogs) -> Result<Flow, FileError> {
        self.request(PendingAction::NewBlank, dialogs)
    }

    pub fn open(
        &mut self,
        path: Option<PathBuf>,
        dialogs: &mut impl FileDialogs,
    ) -> Result<Flow, FileError> {
        self.request(PendingAction::Open(path), dialogs)
    }

    /// Ask to quit. [`Flow::Exit`] means nothing unsaved stands in the way.
    pub fn close(&mut self, dialogs: &mut impl FileDialogs) -> Result<Flow, FileError> {
        self.request(PendingAction::Exit, dialogs)
    }

    /// Run `action` now if the document is clean, otherwise park it behind
    /// the gate. Requests made while the gate is already up are dropped.
    pub fn request(
        &mut self,
        action: PendingAction,
        dialogs: &mut impl FileDialogs,
    ) -> Result<Flow, FileError> {
        if let Some(pending) = &self.pending {
            debug!(?pending, ignored = ?action, "confirmation already pending");
            return Ok(Flow::AwaitingConfirmation);
        }

        if self.doc.is_dirty() {
            debug!(?action, "unsaved changes, asking for confirmation");
            self.pending = Some(action);
            return Ok(Flow::AwaitingConfirmation);
        }

        self.apply(action, dialogs)
    }

    /// Answer the gate. An error from the save branch aborts the parked
    /// request the same way [`GateChoice::Cancel`] does.
    pub fn resolve(
        &mut self,
        choice: GateChoice,
        dialogs: &mut impl FileDialogs,
    ) -> Result<Flow, FileError> {
        let Some(action) = self.pending.take() else {
            debug!(?choice, "no confirmation pending");
            return Ok(Flow::Aborted);
        };
        info!(?action, ?choice, "unsaved-changes gate answered");

        match choice {
            GateChoice::Cancel => Ok(Flow::Aborted),
            GateChoice::Discard => self.apply(action, dialogs),
            GateChoice::Save => match self.save(dialogs)? {
                Saved::Written(_) => self.apply(action, dialogs),
                Saved::Cancelled => Ok(Flow::Aborted),
            },
        }
    }

    fn apply(
        &mut self,
        action: PendingAction,
        dialogs: &mut impl FileDialogs,
    ) -> Result<Flow, FileError> {
        match action {
            PendingAction::NewBlank => {
                self.doc.replace_with(Document::default());
                info!("new document");
                Ok(Flow::Completed)
            }
            PendingAction::Open(path) => {
                let Some(path) = path.or_else(|| dialogs.pick_open()) else {
                    return Ok(Flow::Aborted);
                };
                self.open_path(path)?;
                Ok(Flow::Completed)
            }
            PendingAction::Exit => Ok(Flow::Exit),
        }
    }

    /// Load `path` without consulting the gate. On failure the current
    /// document is left as it was.
    pub fn open_path(&mut self, path: PathBuf) -> Result<(), FileError> {
        let text = disk_io::read_utf8(&path).inspect_err(|err| warn!(%err, "open failed"))?;
        info!(path = %path.display(), bytes = text.len(), "opened");
        self.doc.replace_with(Document::loaded(path, text));
        Ok(())
    }

    /// Write to the current path, or fall through to [`Controller::save_as`]
    /// for an untitled document.
    pub fn save(&mut self, dialogs: &mut impl FileDialogs) -> Result<Saved, FileError> {
        match self.doc.path().map(Path::to_path_buf) {
            Some(path) => self.write_to(path),
            None => self.save_as(dialogs),
        }
    }

    pub fn save_as(&mut self, dialogs: &mut impl FileDialogs) -> Result<Saved, FileError> {
        let suggested = self
            .doc
            .path()
            .and_then(Path::file_name)
            .map_or_else(|| "Untitled.md".to_owned(), |name| name.to_string_lossy().into_owned());
        let Some(path) = dialogs.pick_save(&suggested) else {
            return Ok(Saved::Cancelled);
        };
        self.save_to(path)
    }

    /// Give the document a new identity and write it there. A failed write
    /// keeps the old identity.
    pub fn save_to(&mut self, path: PathBuf) -> Result<Saved, FileError> {
        let previous = self.doc.set_path(Some(path.clone()));
        let result = self.write_to(path);
        if result.is_err() {
            self.doc.set_path(previous);
        }
        result
    }

    fn write_to(&mut self, path: PathBuf) -> Result<Saved, FileError> {
        disk_io::write_utf8(&path, self.doc.text()).inspect_err(|err| warn!(%err, "save failed"))?;
        self.doc.mark_saved();
        info!(path = %path.display(), "saved");
        Ok(Saved::Written(path))
    }
}
