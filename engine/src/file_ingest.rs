//! Loading a local command file into the input buffer.
//!
//! The declared content type must be `text/plain`; anything else is refused
//! before the file is opened. Reads run on the tokio runtime and are applied
//! from `App::tick()`. Only one read can be pending at a time.

use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::task::{JoinError, JoinHandle};

use cmdpad_types::{ContentType, Phase, Severity};

use crate::notifications::NotificationManager;
use crate::session::SessionError;

const LOADED_MESSAGE: &str = "File loaded successfully";

/// Result of asking to load a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStart {
    Started,
    /// Refused up front; the user has been notified.
    Rejected(SessionError),
    /// A submission is loading or another read is pending.
    Busy,
}

#[derive(Debug)]
struct PendingRead {
    path: PathBuf,
    handle: JoinHandle<Result<String, SessionError>>,
}

#[derive(Debug, Default)]
pub struct FileIngestor {
    pending: Option<PendingRead>,
}

impl FileIngestor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Path of the file being read, if any.
    #[must_use]
    pub fn pending_path(&self) -> Option<&Path> {
        self.pending.as_ref().map(|p| p.path.as_path())
    }

    /// Validate `path` and start reading it.
    pub fn ingest(
        &mut self,
        path: PathBuf,
        phase: Phase,
        notifications: &mut NotificationManager,
    ) -> IngestStart {
        if !phase.accepts_submission() || self.pending.is_some() {
            tracing::debug!(path = %path.display(), "File load ignored: busy");
            return IngestStart::Busy;
        }

        let content_type = ContentType::from_path(&path);
        if !content_type.is_plain_text() {
            tracing::info!(path = %path.display(), %content_type, "Rejected non-text file");
            let err = SessionError::UnsupportedFileType(content_type);
            notifications.notify(err.to_string(), Severity::Error);
            return IngestStart::Rejected(err);
        }

        tracing::debug!(path = %path.display(), "Reading command file");
        let read_path = path.clone();
        let handle = tokio::spawn(async move { read_text(&read_path).await });
        self.pending = Some(PendingRead { path, handle });
        IngestStart::Started
    }

    /// Apply a finished read. Returns the file text when it should replace
    /// the input buffer.
    pub fn poll(&mut self, phase: Phase, notifications: &mut NotificationManager) -> Option<String> {
        use futures_util::future::FutureExt;

        if !self.pending.as_ref()?.handle.is_finished() {
            return None;
        }
        let mut pending = self.pending.take()?;
        match (&mut pending.handle).now_or_never() {
            Some(result) => finish_read(&pending.path, result, phase, notifications),
            None => {
                self.pending = Some(pending);
                None
            }
        }
    }

    /// Wait for the pending read, if any, and apply it.
    pub async fn wait(
        &mut self,
        phase: Phase,
        notifications: &mut NotificationManager,
    ) -> Option<String> {
        let mut pending = self.pending.take()?;
        let result = (&mut pending.handle).await;
        finish_read(&pending.path, result, phase, notifications)
    }
}

fn finish_read(
    path: &Path,
    result: Result<Result<String, SessionError>, JoinError>,
    phase: Phase,
    notifications: &mut NotificationManager,
) -> Option<String> {
    let result = result.unwrap_or_else(|e| Err(SessionError::FileRead(e.to_string())));

    if !phase.accepts_submission() {
        tracing::debug!(path = %path.display(), "Discarding file read: submission in progress");
        return None;
    }

    match result {
        Ok(text) => {
            tracing::info!(path = %path.display(), bytes = text.len(), "Loaded command file");
            notifications.notify(LOADED_MESSAGE, Severity::Success);
            Some(text)
        }
        Err(err) => {
            if let SessionError::FileRead(detail) = &err {
                tracing::warn!(path = %path.display(), error = %detail, "Failed to read file");
            }
            notifications.notify(err.to_string(), Severity::Error);
            None
        }
    }
}

/// UTF-8 byte order mark, dropped from the start of a file.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

async fn read_text(path: &Path) -> Result<String, SessionError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| SessionError::FileRead(e.to_string()))?;
    Ok(decode_text(&bytes))
}

/// Decode file bytes as UTF-8 text. A leading BOM is stripped and invalid
/// sequences become U+FFFD, so only IO can fail a read.
fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
