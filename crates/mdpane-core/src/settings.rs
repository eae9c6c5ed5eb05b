//! Optional `settings.toml` in the platform config dir. Read-only: the app
//! never writes it back.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::{SettingsError, markdown::Extensions};

pub const DEFAULT_FONT_SIZE: f32 = 14.0;
const MIN_FONT_SIZE: f32 = 6.0;
const MAX_FONT_SIZE: f32 = 72.0;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Initial state of the Word Wrap toggle.
    pub word_wrap: bool,
    /// Editor font size in points.
    pub font_size: f32,
    pub markdown: Extensions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            word_wrap: false,
            font_size: DEFAULT_FONT_SIZE,
            markdown: Extensions::default(),
        }
    }
}

impl Settings {
    /// `<config dir>/mdpane/settings.toml`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mdpane").join("settings.toml"))
    }

    pub fn from_toml_str(source: &str, path: &Path) -> Result<Self, SettingsError> {
        let mut settings: Self = toml::from_str(source).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.font_size = if settings.font_size.is_finite() {
            settings.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
        } else {
            DEFAULT_FONT_SIZE
        };
        Ok(settings)
    }

    /// Read `path`. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source, path),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load from [`Settings::default_path`], falling back to defaults (with a
    /// warning) on any problem.
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        Self::load(&path).unwrap_or_else(|err| {
            warn!(%err, "ignoring settings file");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Result<Settings, SettingsError> {
        Settings::from_toml_str(source, Path::new("settings.toml"))
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(parse("").ok(), Some(Settings::default()));
    }

    #[test]
    fn partial_file_fills_the_rest() {
        let settings = parse("word_wrap = true\n[markdown]\ntables = true\n");
        let Ok(settings) = settings else {
            panic!("settings should parse: {settings:?}");
        };
        assert!(settings.word_wrap);
        assert!(settings.markdown.tables);
        assert!(!settings.markdown.strikethrough);
        assert!((settings.font_size - DEFAULT_FONT_SIZE).abs() < f32::EPSILON);
    }

    #[test]
    fn font_size_is_clamped() {
        let Ok(settings) = parse("font_size = 500.0") else {
            panic!("settings should parse");
        };
        assert!((settings.font_size - MAX_FONT_SIZE).abs() < f32::EPSILON);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(matches!(
            parse("word_wrap = \"yes\""),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let Ok(dir) = tempfile::tempdir() else {
            panic!("tempdir");
        };
        let loaded = Settings::load(&dir.path().join("settings.toml"));
        assert_eq!(loaded.ok(), Some(Settings::default()));
    }
}
