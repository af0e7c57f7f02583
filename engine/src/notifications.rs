//! Transient, auto-expiring status messages.
//!
//! Only one notification is visible at a time and the newest always wins.
//! Every notification owns its own expiry timer: a tokio task that sleeps
//! for the configured delay and then reports the notification's id.
//! Replacing a notification drops it, and dropping aborts its timer, so a
//! stale timer can never clear a newer message. Ids are checked as well in
//! case an expiry was already queued when the replacement happened.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use cmdpad_types::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

/// A displayed notification and the timer that will clear it.
#[derive(Debug)]
pub struct Notification {
    id: NotificationId,
    text: String,
    severity: Severity,
    expires_at: Instant,
    expiry: JoinHandle<()>,
}

impl Notification {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[must_use]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

impl Drop for Notification {
    fn drop(&mut self) {
        self.expiry.abort();
    }
}

#[derive(Debug)]
pub struct NotificationManager {
    current: Option<Notification>,
    next_id: u64,
    delay: Duration,
    expired_tx: mpsc::UnboundedSender<NotificationId>,
    expired_rx: mpsc::UnboundedReceiver<NotificationId>,
}

impl NotificationManager {
    /// Must be called from within a tokio runtime: `notify` spawns timers.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        Self {
            current: None,
            next_id: 0,
            delay,
            expired_tx,
            expired_rx,
        }
    }

    /// Show `text`, replacing whatever is displayed, and schedule its removal.
    pub fn notify(&mut self, text: impl Into<String>, severity: Severity) -> NotificationId {
        let id = NotificationId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);

        // The deadline is fixed here, not when the task is first polled.
        let expires_at = Instant::now() + self.delay;
        let tx = self.expired_tx.clone();
        let expiry = tokio::spawn(async move {
            time::sleep_until(expires_at).await;
            // Receiver gone means the app is shutting down.
            let _ = tx.send(id);
        });

        let text = text.into();
        tracing::debug!(id = id.0, severity = severity.label(), text = %text, "Notification");

        // Assigning drops the previous notification, which aborts its timer.
        self.current = Some(Notification {
            id,
            text,
            severity,
            expires_at,
            expiry,
        });
        id
    }

    /// Apply expiries reported by timers. Returns `true` if the visible
    /// notification was cleared.
    pub fn poll_expired(&mut self) -> bool {
        let mut cleared = false;
        while let Ok(id) = self.expired_rx.try_recv() {
            if self.current.as_ref().is_some_and(|n| n.id == id) {
                self.current = None;
                cleared = true;
            }
        }
        cleared
    }

    #[must_use]
    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
