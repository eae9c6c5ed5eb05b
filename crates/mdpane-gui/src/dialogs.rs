#![forbid(unsafe_code)]

use std::path::PathBuf;

use mdpane_core::FileDialogs;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Blocking native pickers. They run on the UI thread, like the rest of the
/// file lifecycle.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NativeDialogs;

fn picker(title: &str) -> rfd::FileDialog {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Markdown Files", MARKDOWN_EXTENSIONS)
        .add_filter("All Files", &["*"])
}

impl FileDialogs for NativeDialogs {
    fn pick_open(&mut self) -> Option<PathBuf> {
        picker("Open Markdown File").pick_file()
    }

    fn pick_save(&mut self, suggested_name: &str) -> Option<PathBuf> {
        picker("Save Markdown File")
            .set_file_name(suggested_name)
            .save_file()
    }
}
