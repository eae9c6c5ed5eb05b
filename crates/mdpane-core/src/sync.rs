//! Keeps the preview in step with the editor: full re-render on every text
//! change, and one-way scroll mapping from editor to preview.

use std::time::{Duration, Instant};

use crate::{Document, PreviewRenderer, PreviewSurface};

/// Delay before re-applying the scroll position after a render, giving the
/// new content one layout pass to report its real height.
pub const SETTLE_DELAY: Duration = Duration::from_millis(50);

/// `position / maximum` clamped to `[0, 1]`; 0 when there is nothing to scroll.
pub fn scroll_ratio(position: f32, maximum: f32) -> f32 {
    if maximum <= 0.0 || !maximum.is_finite() || !position.is_finite() {
        return 0.0;
    }
    (position / maximum).clamp(0.0, 1.0)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScrollSync {
    ratio: f32,
    settle_at: Option<Instant>,
}

impl ScrollSync {
    pub const fn ratio(&self) -> f32 {
        self.ratio
    }

    /// Record the editor's vertical scroll extent.
    pub fn track_editor(&mut self, position: f32, maximum: f32) -> f32 {
        self.ratio = scroll_ratio(position, maximum);
        self.ratio
    }

    pub fn apply(&self, surface: &mut impl PreviewSurface) {
        let height = surface.content_height().max(0.0);
        surface.scroll_to(self.ratio * height);
    }

    fn schedule_settle(&mut self, now: Instant) {
        self.settle_at = Some(now + SETTLE_DELAY);
    }

    pub const fn settle_pending(&self) -> bool {
        self.settle_at.is_some()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Drives the render and scroll loop for one window.
#[derive(Debug, Default)]
pub struct PreviewSync {
    renderer: PreviewRenderer,
    scroll: ScrollSync,
    rendered_revision: Option<u64>,
    generation: Option<u64>,
}

impl PreviewSync {
    pub fn new(renderer: PreviewRenderer) -> Self {
        Self {
            renderer,
            ..Self::default()
        }
    }

    pub const fn scroll(&self) -> &ScrollSync {
        &self.scroll
    }

    /// Re-render into `surface` if `doc` changed since the last call.
    ///
    /// A freshly loaded document also forgets the previous scroll position.
    pub fn refresh(
        &mut self,
        doc: &Document,
        surface: &mut impl PreviewSurface,
        now: Instant,
    ) -> bool {
        if self.generation != Some(doc.generation()) {
            self.generation = Some(doc.generation());
            self.scroll.reset();
        }
        if self.rendered_revision == Some(doc.revision()) {
            return false;
        }

        surface.replace(self.renderer.render(doc.text()));
        self.rendered_revision = Some(doc.revision());
        self.scroll.apply(surface);
        self.scroll.schedule_settle(now);
        true
    }

    /// Keep the ratio current without moving the preview.
    pub fn observe_editor(&mut self, position: f32, maximum: f32) {
        self.scroll.track_editor(position, maximum);
    }

    pub fn cursor_moved(
        &mut self,
        position: f32,
        maximum: f32,
        surface: &mut impl PreviewSurface,
    ) {
        self.scroll.track_editor(position, maximum);
        self.scroll.apply(surface);
    }

    /// Fire the deferred scroll re-application once it is due. Returns how
    /// long the caller should wait before ticking again.
    pub fn tick(&mut self, now: Instant, surface: &mut impl PreviewSurface) -> Option<Duration> {
        let due = self.scroll.settle_at?;
        if now < due {
            return Some(due - now);
        }
        self.scroll.settle_at = None;
        self.scroll.apply(surface);
        None
    }
}
