//! Core domain types for cmdpad.
//!
//! This crate intentionally has no IO and no async. It holds the vocabulary
//! shared by the engine, the HTTP client, and the TUI:
//!
//! - [`Phase`]: lifecycle of the single submission
//! - [`Severity`]: notification severity
//! - [`LineIndex`]: line labels derived from the editor text
//! - [`ContentType`]: declared content type of a local file
//! - [`NonEmptyString`]: a command that passed the empty-input check

mod content_type;
mod lines;
mod sanitize;

pub use content_type::ContentType;
pub use lines::{LineIndex, LineLabels};
pub use sanitize::sanitize_terminal_text;

use thiserror::Error;

/// Lifecycle phase of the console session.
///
/// Exactly one phase is active at a time. `Loading` gates submission, reset,
/// and file ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl Phase {
    /// Whether a new submission (or reset, or file load) may start.
    #[must_use]
    pub const fn accepts_submission(self) -> bool {
        !matches!(self, Phase::Loading)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Loading => "running",
            Phase::Succeeded => "ok",
            Phase::Failed => "failed",
        }
    }
}

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

impl Severity {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Info => "info",
        }
    }
}

/// Text that is not empty after trimming.
///
/// The original (untrimmed) text is kept: the console submits exactly what
/// the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyString(String);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("text must not be empty")]
pub struct EmptyStringError;

impl NonEmptyString {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyStringError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyStringError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_rejects_whitespace() {
        assert_eq!(NonEmptyString::new(""), Err(EmptyStringError));
        assert_eq!(NonEmptyString::new(" \n\t "), Err(EmptyStringError));
    }

    #[test]
    fn non_empty_keeps_untrimmed_text() {
        let text = NonEmptyString::new("  mkdisk -size=5\n").unwrap();
        assert_eq!(text.as_str(), "  mkdisk -size=5\n");
    }

    #[test]
    fn only_loading_blocks_submission() {
        assert!(Phase::Idle.accepts_submission());
        assert!(Phase::Succeeded.accepts_submission());
        assert!(Phase::Failed.accepts_submission());
        assert!(!Phase::Loading.accepts_submission());
    }
}
