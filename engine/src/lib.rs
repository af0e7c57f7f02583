//! Core engine for cmdpad - state machine and orchestration.
//!
//! This crate contains the [`App`] state machine without TUI dependencies.
//! The binary drives it from a frame loop: input handlers call the `App`
//! methods, `tick()` applies finished background work, and the renderer
//! reads the accessors.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

pub use cmdpad_client::{AnalysisService, AnalyzeClient, AnalyzeError};
pub use cmdpad_types::{
    ContentType, LineIndex, NonEmptyString, Phase, Severity, sanitize_terminal_text,
};

mod config;
mod editor;
mod file_ingest;
mod file_picker;
mod input_modes;
mod line_sync;
mod notifications;
mod session;

pub use config::{
    ConfigError, ConsoleConfig, ENDPOINT_ENV, ServiceConfig, Settings, UiConfig, UiOptions,
    config_path,
};
pub use editor::Editor;
pub use file_ingest::{FileIngestor, IngestStart};
pub use file_picker::{AcceptFilter, FileEntry, FilePickerState};
pub use input_modes::{InsertMode, InsertToken};
pub use line_sync::{LineNumberSync, ScrollOffset};
pub use notifications::{Notification, NotificationId, NotificationManager};
pub use session::{SessionController, SessionError, SubmitOutcome};

/// Lines moved by a single output scroll step.
const OUTPUT_SCROLL_STEP: u16 = 1;

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Insert,
    FileSelect,
}

#[derive(Debug)]
pub struct App {
    session: SessionController,
    notifications: NotificationManager,
    line_sync: LineNumberSync,
    ingestor: FileIngestor,
    file_picker: FilePickerState,
    input_mode: InputMode,
    /// Rows available to the editor, reported by the renderer.
    editor_viewport: usize,
    output_scroll: u16,
    output_scroll_max: u16,
    endpoint: Url,
    ui: UiOptions,
    workdir: PathBuf,
    should_quit: bool,
    tick: usize,
}

impl App {
    /// Build the app with an HTTP client for `settings.endpoint`.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let client = AnalyzeClient::new(settings.endpoint.clone(), settings.timeout)?;
        Ok(Self::with_service(settings, Arc::new(client)))
    }

    /// Build the app around any analysis service.
    #[must_use]
    pub fn with_service(settings: &Settings, service: Arc<dyn AnalysisService>) -> Self {
        let workdir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            session: SessionController::new(service),
            notifications: NotificationManager::new(settings.notification_delay),
            line_sync: LineNumberSync::new(),
            ingestor: FileIngestor::new(),
            file_picker: FilePickerState::new(),
            input_mode: InputMode::Normal,
            editor_viewport: 0,
            output_scroll: 0,
            output_scroll_max: 0,
            endpoint: settings.endpoint.clone(),
            ui: settings.ui,
            workdir,
            should_quit: false,
            tick: 0,
        }
    }

    // ------------------------------------------------------------------
    // Frame loop
    // ------------------------------------------------------------------

    /// Increment animation tick and apply finished background work.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        self.notifications.poll_expired();
        self.file_picker.poll_scan();

        if self.session.poll(&mut self.notifications) {
            self.scroll_output_to_top();
        }

        let phase = self.session.phase();
        if let Some(text) = self.ingestor.poll(phase, &mut self.notifications) {
            self.apply_loaded_text(text);
        }
    }

    /// Wait for the in-flight submission, the pending file read, and a
    /// running file picker scan, then apply them.
    pub async fn wait_for_settlement(&mut self) {
        self.file_picker.wait_for_scan().await;

        if self.session.is_loading() {
            self.session
                .wait_for_settlement(&mut self.notifications)
                .await;
            self.scroll_output_to_top();
        }

        let phase = self.session.phase();
        if let Some(text) = self.ingestor.wait(phase, &mut self.notifications).await {
            self.apply_loaded_text(text);
        }
    }

    pub fn tick_count(&self) -> usize {
        self.tick
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        if self.session.is_loading() {
            tracing::info!("Quitting with a submission in flight; its result is discarded");
        }
        self.should_quit = true;
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        self.session.phase()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub fn input_text(&self) -> &str {
        self.session.input_text()
    }

    pub fn editor(&self) -> &Editor {
        self.session.input()
    }

    pub fn output_text(&self) -> &str {
        self.session.output_text()
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn ui_options(&self) -> UiOptions {
        self.ui
    }

    /// Submit the input buffer for execution.
    pub fn submit(&mut self) -> SubmitOutcome {
        let outcome = self.session.submit(&mut self.notifications);
        if outcome == SubmitOutcome::Started {
            self.input_mode = InputMode::Normal;
        }
        outcome
    }

    /// Clear input and output. Ignored while a submission is loading.
    pub fn reset(&mut self) -> bool {
        if !self.session.reset(&mut self.notifications) {
            return false;
        }
        self.input_text_changed();
        self.scroll_output_to_top();
        true
    }

    // ------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------

    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.current()
    }

    pub fn push_notification(&mut self, text: impl Into<String>, severity: Severity) {
        self.notifications.notify(text, severity);
    }

    pub fn dismiss_notification(&mut self) {
        self.notifications.dismiss();
    }

    // ------------------------------------------------------------------
    // Line numbers and editor viewport
    // ------------------------------------------------------------------

    pub fn line_sync(&self) -> &LineNumberSync {
        &self.line_sync
    }

    /// Record the editor height from the last layout and keep the cursor
    /// visible in it.
    pub fn set_editor_viewport(&mut self, height: usize) {
        if self.editor_viewport != height {
            self.editor_viewport = height;
            self.follow_input_cursor();
        }
    }

    pub fn editor_viewport(&self) -> usize {
        self.editor_viewport
    }

    /// Scroll the editor without moving the cursor.
    pub fn scroll_editor(&mut self, delta: isize) {
        if let Some(top) = self.session.scroll_input(delta, self.editor_viewport) {
            self.line_sync.on_editor_scroll(top);
        }
    }

    pub(crate) fn input_text_changed(&mut self) {
        self.line_sync.on_text_changed(self.session.input_text());
        self.follow_input_cursor();
    }

    pub(crate) fn follow_input_cursor(&mut self) {
        if let Some(top) = self.session.follow_input_cursor(self.editor_viewport) {
            self.line_sync.on_editor_scroll(top);
        }
    }

    // ------------------------------------------------------------------
    // Output view
    // ------------------------------------------------------------------

    /// Set the largest useful output offset for the current layout.
    pub fn update_output_scroll_max(&mut self, max: u16) {
        self.output_scroll_max = max;
        self.output_scroll = self.output_scroll.min(max);
    }

    pub fn output_scroll(&self) -> u16 {
        self.output_scroll.min(self.output_scroll_max)
    }

    pub fn scroll_output_up(&mut self, lines: u16) {
        self.output_scroll = self.output_scroll().saturating_sub(lines);
    }

    pub fn scroll_output_down(&mut self, lines: u16) {
        self.output_scroll = self
            .output_scroll()
            .saturating_add(lines)
            .min(self.output_scroll_max);
    }

    pub fn scroll_output_line_up(&mut self) {
        self.scroll_output_up(OUTPUT_SCROLL_STEP);
    }

    pub fn scroll_output_line_down(&mut self) {
        self.scroll_output_down(OUTPUT_SCROLL_STEP);
    }

    pub fn scroll_output_to_top(&mut self) {
        self.output_scroll = 0;
    }

    pub fn scroll_output_to_bottom(&mut self) {
        self.output_scroll = self.output_scroll_max;
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    /// Start editing. The editor is disabled while a submission is loading.
    pub fn enter_insert_mode(&mut self) {
        if self.session.is_loading() {
            tracing::debug!("Editing disabled while a submission is running");
            return;
        }
        self.input_mode = InputMode::Insert;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    // ------------------------------------------------------------------
    // File loading
    // ------------------------------------------------------------------

    pub fn file_picker(&self) -> &FilePickerState {
        &self.file_picker
    }

    pub fn file_picker_mut(&mut self) -> &mut FilePickerState {
        &mut self.file_picker
    }

    /// Open the file picker on the working directory.
    pub fn open_file_picker(&mut self) {
        let root = self.workdir.clone();
        self.open_file_picker_in(&root);
    }

    /// Open the file picker on `root`. Disabled while loading.
    pub fn open_file_picker_in(&mut self, root: &Path) {
        if self.session.is_loading() || self.ingestor.is_pending() {
            tracing::debug!("File picker disabled: busy");
            return;
        }
        self.file_picker.open(root);
        self.input_mode = InputMode::FileSelect;
    }

    pub fn file_picker_cancel(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Load the selected file. Nothing happens when no file matches.
    pub fn file_picker_confirm(&mut self) -> Option<IngestStart> {
        let path = self.file_picker.selected_file()?.path.clone();
        self.input_mode = InputMode::Normal;
        Some(self.load_file(path))
    }

    /// Validate and start reading `path` into the input buffer.
    pub fn load_file(&mut self, path: PathBuf) -> IngestStart {
        self.ingestor
            .ingest(path, self.session.phase(), &mut self.notifications)
    }

    pub fn is_reading_file(&self) -> bool {
        self.ingestor.is_pending()
    }

    /// File currently being read into the input buffer.
    pub fn pending_file(&self) -> Option<&Path> {
        self.ingestor.pending_path()
    }

    fn apply_loaded_text(&mut self, text: String) {
        if self.session.replace_input(text) {
            self.input_text_changed();
        }
    }
}
