use std::{collections::VecDeque, fs, path::PathBuf, time::Instant};

use mdpane_core::{
    Controller, FileDialogs, Flow, GateChoice, PreviewSurface, PreviewSync, RenderedPreview, Saved,
};

#[derive(Default)]
struct Dialogs {
    saves: VecDeque<PathBuf>,
    opens: VecDeque<PathBuf>,
}

impl FileDialogs for Dialogs {
    fn pick_open(&mut self) -> Option<PathBuf> {
        self.opens.pop_front()
    }

    fn pick_save(&mut self, _suggested_name: &str) -> Option<PathBuf> {
        self.saves.pop_front()
    }
}

#[derive(Default)]
struct Surface {
    current: Option<RenderedPreview>,
    replaced: usize,
}

impl PreviewSurface for Surface {
    fn replace(&mut self, preview: RenderedPreview) {
        self.current = Some(preview);
        self.replaced += 1;
    }

    fn content_height(&self) -> f32 {
        0.0
    }

    fn scroll_to(&mut self, _offset: f32) {}
}

fn type_text(ctl: &mut Controller, text: &str) {
    for ch in text.chars() {
        ctl.document_mut().text_mut().push(ch);
        ctl.document_mut().mark_edited();
    }
}

#[test]
fn type_preview_and_save_as() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir");
    };
    let target = dir.path().join("doc.md");

    let mut ctl = Controller::new();
    let mut sync = PreviewSync::default();
    let mut surface = Surface::default();
    let mut dialogs = Dialogs {
        saves: VecDeque::from([target.clone()]),
        ..Dialogs::default()
    };

    sync.refresh(ctl.document(), &mut surface, Instant::now());
    assert_eq!(ctl.document().window_title(), "Untitled - Markdown Editor");

    let typed = "# Hello\n\nWorld";
    for ch in typed.chars() {
        type_text(&mut ctl, &ch.to_string());
        sync.refresh(ctl.document(), &mut surface, Instant::now());
    }
    // One render for the empty document, then one per keystroke.
    assert_eq!(surface.replaced, 1 + typed.chars().count());

    let Some(preview) = surface.current.as_ref() else {
        panic!("preview should have been rendered");
    };
    let fragment = preview.fragment();
    let heading = fragment.find("<h1>Hello</h1>");
    let paragraph = fragment.find("<p>World</p>");
    assert!(heading.is_some() && paragraph.is_some());
    assert!(heading < paragraph);

    assert!(ctl.document().is_dirty());
    assert_eq!(ctl.document().window_title(), "*Untitled - Markdown Editor");

    assert_eq!(ctl.save_as(&mut dialogs).ok(), Some(Saved::Written(target.clone())));
    assert_eq!(fs::read_to_string(&target).unwrap_or_default(), typed);
    assert!(!ctl.document().is_dirty());
    assert_eq!(ctl.document().window_title(), "doc.md - Markdown Editor");
}

#[test]
fn reopen_after_discarding_edits() {
    let Ok(dir) = tempfile::tempdir() else {
        panic!("tempdir");
    };
    let path = dir.path().join("notes.markdown");
    let original = "line one\r\nline two\nünïcödé ✓\n";
    fs::write(&path, original).ok();

    let mut ctl = Controller::new();
    let mut sync = PreviewSync::default();
    let mut surface = Surface::default();
    let mut dialogs = Dialogs {
        opens: VecDeque::from([path.clone(), path.clone()]),
        ..Dialogs::default()
    };

    assert!(matches!(ctl.open(None, &mut dialogs), Ok(Flow::Completed)));
    assert_eq!(ctl.document().text(), original);
    assert!(!ctl.document().is_dirty());

    type_text(&mut ctl, "scratch");
    assert!(matches!(
        ctl.open(None, &mut dialogs),
        Ok(Flow::AwaitingConfirmation)
    ));
    assert!(matches!(
        ctl.resolve(GateChoice::Discard, &mut dialogs),
        Ok(Flow::Completed)
    ));

    assert_eq!(ctl.document().text(), original);
    assert!(!ctl.document().is_dirty());
    assert!(sync.refresh(ctl.document(), &mut surface, Instant::now()));
    assert_eq!(
        surface.current.as_ref().map(RenderedPreview::markdown),
        Some(original)
    );
}
