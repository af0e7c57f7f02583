//! cmdpad CLI - binary entry point and terminal session management.
//!
//! The binary bridges [`cmdpad_engine`] (application state) and [`cmdpad_tui`]
//! (rendering). Terminal state is owned by an RAII guard so it is restored
//! on every exit path.
//!
//! # Event Loop
//!
//! A fixed 8ms render cadence:
//!
//! 1. Wait for frame tick
//! 2. Drain input queue (non-blocking via [`cmdpad_tui::InputPump`])
//! 3. Advance application state (`app.tick()`)
//! 4. Render frame

use anyhow::Result;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tokio::time::{self, MissedTickBehavior};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cmdpad_engine::{App, ConfigError, ConsoleConfig, Settings, Severity, config_path};
use cmdpad_tui::{InputPump, draw, handle_events};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file(&log_file_candidates());

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than write over the TUI.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file(candidates: &[PathBuf]) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in candidates {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(candidate) {
            Ok(file) => return (Some((candidate.clone(), file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.cmdpad/logs/cmdpad.log
    if let Some(config_path) = config_path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("cmdpad.log"));
    }

    // Fallback: ./.cmdpad/logs/cmdpad.log
    candidates.push(PathBuf::from(".cmdpad").join("logs").join("cmdpad.log"));

    candidates
}

/// Resolve settings from the config file and environment. Errors fall back
/// to defaults and are returned so the UI can show them.
fn load_settings() -> (Settings, Option<ConfigError>) {
    let resolved = ConsoleConfig::load()
        .and_then(|config| config.unwrap_or_default().resolve());
    match resolved {
        Ok(settings) => (settings, None),
        Err(err) => {
            tracing::warn!("Using default settings: {err}");
            (Settings::default(), Some(err))
        }
    }
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Enables raw mode, bracketed paste, and the alternate screen. On drop
/// all of it is restored, so the terminal stays usable after panics or
/// early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnableBracketedPaste, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            let _ = execute!(out, LeaveAlternateScreen, DisableBracketedPaste);
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen, DisableBracketedPaste);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let (settings, config_error) = load_settings();
    tracing::info!(endpoint = %settings.endpoint, "Starting cmdpad");
    let mut app = App::new(&settings)?;
    if let Some(err) = config_error {
        app.push_notification(format!("Config error: {err}"), Severity::Error);
    }

    let result = {
        let mut session = TerminalSession::new()?;
        run_app(&mut session.terminal, &mut app).await
    };

    if let Err(err) = result {
        tracing::error!("Exiting after error: {err:?}");
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

const FRAME_DURATION: Duration = Duration::from_millis(8);

async fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        frames.tick().await;

        // Non-blocking input (drain queue only)
        let quit_now = match handle_events(app, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        app.tick();

        if let Err(e) = terminal.draw(|frame| draw(frame, app)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}
