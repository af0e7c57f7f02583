//! Multi-line command editor.
//!
//! The cursor is a grapheme index, so combining marks and emoji move as one
//! unit. A `\r\n` pair is a single grapheme that counts as a line break.
//! The editor also owns its vertical viewport: any change to `scroll_top`
//! is reported back to the caller as an editor scroll event.

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Default, Clone)]
pub struct Editor {
    text: String,
    cursor: usize,
    scroll_top: usize,
}

fn is_break(grapheme: &str) -> bool {
    grapheme.contains('\n')
}

impl Editor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.text.matches('\n').count() + 1
    }

    /// Replace the whole buffer. The cursor goes to the start, like a
    /// freshly loaded file.
    pub fn set_text(&mut self, text: String) {
        self.text = text;
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn enter_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.enter_text(c.encode_utf8(&mut buf));
    }

    pub fn enter_newline(&mut self) {
        self.enter_char('\n');
    }

    pub fn enter_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let before = self.grapheme_count();
        let index = self.byte_index();
        self.text.insert_str(index, text);
        // Measure the growth of the whole buffer: the inserted text can
        // merge with a neighbouring grapheme.
        let grown = self.grapheme_count().saturating_sub(before);
        self.cursor = self.clamp_cursor(self.cursor + grown);
    }

    /// Backspace.
    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_index_at(self.cursor - 1);
        let end = self.byte_index_at(self.cursor);
        self.text.replace_range(start..end, "");
        self.cursor -= 1;
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }
        let start = self.byte_index_at(self.cursor);
        let end = self.byte_index_at(self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = self.clamp_cursor(self.cursor + 1);
    }

    pub fn move_cursor_up(&mut self) {
        let (line, col) = self.cursor_line_col();
        if line == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = self.position_at(line - 1, col);
    }

    pub fn move_cursor_down(&mut self) {
        let (line, col) = self.cursor_line_col();
        if line + 1 >= self.line_count() {
            self.cursor = self.grapheme_count();
            return;
        }
        self.cursor = self.position_at(line + 1, col);
    }

    pub fn move_cursor_line_start(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor = self.position_at(line, 0);
    }

    pub fn move_cursor_line_end(&mut self) {
        let (line, _) = self.cursor_line_col();
        self.cursor = self.position_at(line, usize::MAX);
    }

    /// Zero-based line and grapheme column of the cursor.
    #[must_use]
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let mut line = 0;
        let mut col = 0;
        for grapheme in self.text.graphemes(true).take(self.cursor) {
            if is_break(grapheme) {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }
        (line, col)
    }

    /// Text of the cursor's line up to the cursor, for display-width math.
    #[must_use]
    pub fn cursor_line_prefix(&self) -> &str {
        let end = self.byte_index();
        let start = self.text[..end].rfind('\n').map_or(0, |i| i + 1);
        &self.text[start..end]
    }

    /// Scroll so the cursor line is inside a viewport of `height` rows.
    /// Returns the new top line when it moved.
    pub fn scroll_to_cursor(&mut self, height: usize) -> Option<usize> {
        if height == 0 {
            return None;
        }
        let (line, _) = self.cursor_line_col();
        let mut top = self.scroll_top;
        if line < top {
            top = line;
        } else if line >= top + height {
            top = line + 1 - height;
        }
        self.set_scroll_top(top.min(self.max_scroll_top(height)))
    }

    /// Scroll the viewport by `delta` lines without moving the cursor.
    pub fn scroll_by(&mut self, delta: isize, height: usize) -> Option<usize> {
        let top = self
            .scroll_top
            .saturating_add_signed(delta)
            .min(self.max_scroll_top(height));
        self.set_scroll_top(top)
    }

    fn max_scroll_top(&self, height: usize) -> usize {
        self.line_count().saturating_sub(height.max(1))
    }

    fn set_scroll_top(&mut self, top: usize) -> Option<usize> {
        if top == self.scroll_top {
            return None;
        }
        self.scroll_top = top;
        Some(top)
    }

    /// Grapheme index of `col` on `line`, clamped to the line's end.
    fn position_at(&self, line: usize, col: usize) -> usize {
        let mut current_line = 0;
        let mut line_col = 0;
        for (idx, grapheme) in self.text.graphemes(true).enumerate() {
            if current_line == line {
                if is_break(grapheme) || line_col == col {
                    return idx;
                }
                line_col += 1;
            } else if is_break(grapheme) {
                current_line += 1;
            }
        }
        self.grapheme_count()
    }

    fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    fn byte_index(&self) -> usize {
        self.byte_index_at(self.cursor)
    }

    fn byte_index_at(&self, grapheme_index: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme_index)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn clamp_cursor(&self, position: usize) -> usize {
        position.min(self.grapheme_count())
    }
}
