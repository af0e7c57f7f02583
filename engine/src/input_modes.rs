//! Input mode wrappers for type-safe mode-specific operations.
//!
//! Editing the command text is only possible through [`InsertMode`], which
//! can only be obtained with an [`InsertToken`]. The token is handed out in
//! Insert mode and never while a submission is loading.

use super::App;
use crate::editor::Editor;

/// Proof token for Insert mode operations.
#[derive(Debug)]
pub struct InsertToken(());

/// Mode wrapper for safe insert operations.
pub struct InsertMode<'a> {
    pub(crate) app: &'a mut App,
}

impl App {
    /// Get proof token if editing is currently allowed.
    pub fn insert_token(&self) -> Option<InsertToken> {
        (self.input_mode == super::InputMode::Insert && !self.session.is_loading())
            .then_some(InsertToken(()))
    }

    /// Get insert mode wrapper (requires proof token).
    pub fn insert_mode(&mut self, _token: InsertToken) -> InsertMode<'_> {
        InsertMode { app: self }
    }
}

// ============================================================================
// InsertMode operations
// ============================================================================

impl InsertMode<'_> {
    /// Apply a text edit, then refresh the line index and viewport.
    fn edit(&mut self, f: impl FnOnce(&mut Editor)) {
        if let Some(editor) = self.app.session.input_mut() {
            f(editor);
        }
        self.app.input_text_changed();
    }

    /// Apply a cursor move, then keep the cursor visible.
    fn navigate(&mut self, f: impl FnOnce(&mut Editor)) {
        if let Some(editor) = self.app.session.input_mut() {
            f(editor);
        }
        self.app.follow_input_cursor();
    }

    pub fn enter_char(&mut self, new_char: char) {
        self.edit(|e| e.enter_char(new_char));
    }

    pub fn enter_newline(&mut self) {
        self.edit(Editor::enter_newline);
    }

    pub fn enter_text(&mut self, text: &str) {
        self.edit(|e| e.enter_text(text));
    }

    pub fn delete_char(&mut self) {
        self.edit(Editor::delete_char);
    }

    pub fn delete_char_forward(&mut self) {
        self.edit(Editor::delete_char_forward);
    }

    pub fn move_cursor_left(&mut self) {
        self.navigate(Editor::move_cursor_left);
    }

    pub fn move_cursor_right(&mut self) {
        self.navigate(Editor::move_cursor_right);
    }

    pub fn move_cursor_up(&mut self) {
        self.navigate(Editor::move_cursor_up);
    }

    pub fn move_cursor_down(&mut self) {
        self.navigate(Editor::move_cursor_down);
    }

    pub fn move_cursor_line_start(&mut self) {
        self.navigate(Editor::move_cursor_line_start);
    }

    pub fn move_cursor_line_end(&mut self) {
        self.navigate(Editor::move_cursor_line_end);
    }
}
