use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures of the file lifecycle operations.
///
/// User cancellation is deliberately absent: a dismissed dialog is reported
/// as [`crate::Flow::Aborted`] or [`crate::Saved::Cancelled`].
#[derive(Debug, Error)]
pub enum FileError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    InvalidUtf8 { path: PathBuf },

    #[error("{path} is too large to open ({len} bytes)")]
    TooLarge { path: PathBuf, len: u64 },

    #[error("Failed to save file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FileError {
    /// `true` for the failures that happen while loading a file.
    pub const fn is_read(&self) -> bool {
        !matches!(self, Self::Write { .. })
    }

    /// Short heading for the modal the shell shows.
    pub const fn heading(&self) -> &'static str {
        if self.is_read() {
            "Open Error"
        } else {
            "Save Error"
        }
    }
}

/// Failures while loading `settings.toml`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
