#![forbid(unsafe_code)]

//! Shared logic for `mdpane` (GUI + CLI).
//!
//! The desktop shell owns widgets, dialogs and menus; everything it needs to
//! decide *what* to show lives here: the document and its file lifecycle,
//! markdown conversion, the HTML preview template, and scroll mapping.

pub mod disk_io;
pub mod document;
pub mod error;
pub mod lifecycle;
pub mod markdown;
pub mod render;
pub mod settings;
pub mod sync;

pub use document::Document;
pub use error::{FileError, SettingsError};
pub use lifecycle::{Controller, FileDialogs, Flow, GateChoice, PendingAction, Phase, Saved};
pub use render::{PreviewRenderer, PreviewSurface, RenderedPreview};
pub use settings::Settings;
pub use sync::{PreviewSync, ScrollSync};

/// Application name used in window titles and dialogs.
pub const APP_NAME: &str = "Markdown Editor";

/// Hard cap on file sizes we will load into memory.
pub const MAX_FILE_BYTES: u64 = 64 * 1024 * 1024;
