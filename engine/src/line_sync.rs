//! Line-number gutter kept in step with the editor.
//!
//! The gutter never scrolls on its own. Its offset is a pure function of the
//! editor offset (`gutter = editor`) and is only updated from editor scroll
//! events, so there is no way to build a feedback loop between the two.

use cmdpad_types::LineIndex;

/// Editor and gutter scroll offsets, in lines from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollOffset {
    editor: usize,
    gutter: usize,
}

impl ScrollOffset {
    #[must_use]
    pub const fn editor(self) -> usize {
        self.editor
    }

    #[must_use]
    pub const fn gutter(self) -> usize {
        self.gutter
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineNumberSync {
    index: LineIndex,
    scroll: ScrollOffset,
}

impl LineNumberSync {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the line index for new editor text.
    pub fn on_text_changed(&mut self, text: &str) -> LineIndex {
        self.index = LineIndex::from_text(text);
        self.index
    }

    /// Mirror an editor scroll onto the gutter.
    pub fn on_editor_scroll(&mut self, offset: usize) {
        self.scroll = ScrollOffset {
            editor: offset,
            gutter: offset,
        };
    }

    #[must_use]
    pub fn index(&self) -> LineIndex {
        self.index
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    /// Labels the gutter shows for a viewport of `height` rows.
    pub fn visible_labels(&self, height: usize) -> impl Iterator<Item = usize> + '_ {
        self.index.labels().skip(self.scroll.gutter).take(height)
    }
}
