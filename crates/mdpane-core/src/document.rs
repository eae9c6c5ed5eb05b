use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use crate::APP_NAME;

/// The single open markdown document.
#[derive(Debug, Default)]
pub struct Document {
    path: Option<PathBuf>,
    text: String,
    dirty: bool,
    revision: u64,
    generation: u64,
}

impl Document {
    /// A clean document loaded from `path`.
    pub(crate) fn loaded(path: PathBuf, text: String) -> Self {
        Self {
            path: Some(path),
            text,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Mutable access for the editor widget.
    ///
    /// Callers must follow up with [`Document::mark_edited`] when the widget
    /// reports a change.
    pub fn text_mut(&mut self) -> &mut String {
        &mut self.text
    }

    /// Replace the whole text, as a paste-over or programmatic edit would.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.mark_edited();
    }

    pub fn mark_edited(&mut self) {
        self.dirty = true;
        self.revision = self.revision.wrapping_add(1);
    }

    pub(crate) fn mark_saved(&mut self) {
        self.dirty = false;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn set_path(&mut self, path: Option<PathBuf>) -> Option<PathBuf> {
        std::mem::replace(&mut self.path, path)
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Bumped on every text change and on every wholesale replacement.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Bumped each time the document is replaced by "New" or "Open".
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Swap in `next`, keeping the counters monotonic across documents.
    pub(crate) fn replace_with(&mut self, mut next: Self) {
        next.revision = self.revision.wrapping_add(1);
        next.generation = self.generation.wrapping_add(1);
        *self = next;
    }

    /// File name shown in titles and prompts.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.path
            .as_ref()
            .and_then(|path| path.file_name())
            .map_or_else(|| Cow::Borrowed("Untitled"), |name| name.to_string_lossy())
    }

    /// `[*]<name> - Markdown Editor`, starred when there are unsaved changes.
    pub fn window_title(&self) -> String {
        format!(
            "{}{} - {APP_NAME}",
            if self.dirty { "*" } else { "" },
            self.display_name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_is_clean_and_untitled() {
        let doc = Document::default();
        assert!(!doc.is_dirty());
        assert_eq!(doc.path(), None);
        assert_eq!(doc.text(), "");
        assert_eq!(doc.window_title(), "Untitled - Markdown Editor");
    }

    #[test]
    fn any_edit_marks_dirty_even_back_to_empty() {
        let mut doc = Document::default();
        doc.set_text("x");
        assert!(doc.is_dirty());
        doc.set_text("");
        assert!(doc.is_dirty());
        assert_eq!(doc.window_title(), "*Untitled - Markdown Editor");
    }

    #[test]
    fn title_uses_file_name_only() {
        let doc = Document::loaded(PathBuf::from("notes/dir/readme.md"), String::new());
        assert_eq!(doc.window_title(), "readme.md - Markdown Editor");
    }

    #[test]
    fn replacement_bumps_counters() {
        let mut doc = Document::default();
        doc.set_text("abc");
        let (rev, generation) = (doc.revision(), doc.generation());

        doc.replace_with(Document::default());
        assert!(doc.revision() > rev);
        assert_eq!(doc.generation(), generation + 1);
        assert!(!doc.is_dirty());
    }
}
