//! Input handling for cmdpad TUI.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tokio::time;

use cmdpad_engine::{App, InputMode};

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

/// Lines moved by PageUp/PageDown in the output panel.
const OUTPUT_PAGE_LINES: u16 = 10;

/// Lines moved by Ctrl+E/Ctrl+Y in the editor.
const EDITOR_SCROLL_LINES: isize = 1;

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

enum InputMsg {
    Event(Event),
    Error(String),
}

pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = task::spawn_blocking(move || input_loop(stop2, tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Close the receiver first so the input thread cannot stay blocked
        // on a full channel.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Best-effort stop if caller exits early; do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: Arc<AtomicBool>, tx: mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    // Bounded queue: apply backpressure instead of dropping events.
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending input into `app`. Returns `true` when the app should quit.
pub fn handle_events(app: &mut App, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };

        if apply_event(app, ev) {
            return Ok(true);
        }
        processed += 1;
    }
    Ok(app.should_quit())
}

/// Apply one terminal event. Returns `true` when the app should quit.
pub fn apply_event(app: &mut App, event: Event) -> bool {
    match event {
        Event::Key(key) => {
            // Handle press + repeat events (ignore releases)
            if matches!(key.kind, KeyEventKind::Release) {
                return app.should_quit();
            }

            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                app.request_quit();
                return true;
            }

            match app.input_mode() {
                InputMode::Normal => handle_normal_mode(app, key),
                InputMode::Insert => handle_insert_mode(app, key),
                InputMode::FileSelect => handle_file_select_mode(app, key),
            }
        }
        Event::Paste(text) => {
            if let Some(token) = app.insert_token() {
                let normalized = normalize_line_endings(&text);
                app.insert_mode(token).enter_text(&normalized);
            }
        }
        _ => {}
    }
    app.should_quit()
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') => {
            app.request_quit();
        }
        KeyCode::Char('i') => {
            app.enter_insert_mode();
        }
        KeyCode::Enter | KeyCode::Char('x') => {
            app.submit();
        }
        KeyCode::Char('o') => {
            app.open_file_picker();
        }
        KeyCode::Char('c') => {
            app.reset();
        }
        // Editor viewport (vim-style Ctrl+E / Ctrl+Y)
        KeyCode::Char('e') if ctrl => {
            app.scroll_editor(EDITOR_SCROLL_LINES);
        }
        KeyCode::Char('y') if ctrl => {
            app.scroll_editor(-EDITOR_SCROLL_LINES);
        }
        // Output panel
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_output_line_down();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_output_line_up();
        }
        KeyCode::PageDown => {
            app.scroll_output_down(OUTPUT_PAGE_LINES);
        }
        KeyCode::PageUp => {
            app.scroll_output_up(OUTPUT_PAGE_LINES);
        }
        KeyCode::Char('g') | KeyCode::Home => {
            app.scroll_output_to_top();
        }
        KeyCode::Char('G') | KeyCode::End => {
            app.scroll_output_to_bottom();
        }
        KeyCode::Esc => {
            app.dismiss_notification();
        }
        _ => {}
    }
}

fn handle_insert_mode(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => {
            app.enter_normal_mode();
        }
        KeyCode::Char('r') if ctrl => {
            app.submit();
        }
        KeyCode::Char('e') if ctrl => {
            app.scroll_editor(EDITOR_SCROLL_LINES);
        }
        KeyCode::Char('y') if ctrl => {
            app.scroll_editor(-EDITOR_SCROLL_LINES);
        }
        _ => {
            let Some(token) = app.insert_token() else {
                return;
            };
            let mut insert = app.insert_mode(token);

            match key.code {
                KeyCode::Enter => insert.enter_newline(),
                KeyCode::Backspace => insert.delete_char(),
                KeyCode::Delete => insert.delete_char_forward(),
                KeyCode::Left => insert.move_cursor_left(),
                KeyCode::Right => insert.move_cursor_right(),
                KeyCode::Up => insert.move_cursor_up(),
                KeyCode::Down => insert.move_cursor_down(),
                KeyCode::Home => insert.move_cursor_line_start(),
                KeyCode::End => insert.move_cursor_line_end(),
                KeyCode::Tab => insert.enter_char('\t'),
                // Insert character (ignore \r - it's handled via Enter or normalized in paste)
                KeyCode::Char(c) if c != '\r' && !ctrl => insert.enter_char(c),
                _ => {}
            }
        }
    }
}

fn handle_file_select_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.file_picker_cancel();
        }
        KeyCode::Enter => {
            app.file_picker_confirm();
        }
        KeyCode::Up => {
            app.file_picker_mut().select_prev();
        }
        KeyCode::Down => {
            app.file_picker_mut().select_next();
        }
        // Switch between the .txt filter and all files
        KeyCode::Tab => {
            app.file_picker_mut().toggle_accept();
        }
        KeyCode::Backspace => {
            app.file_picker_mut().pop_filter_char();
        }
        KeyCode::Char(c) if c != '\r' => {
            app.file_picker_mut().push_filter_char(c);
        }
        _ => {}
    }
}
