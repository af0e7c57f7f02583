//! TUI rendering for cmdpad using ratatui.
//!
//! The screen is a single console panel: the command editor with its
//! line-number gutter, the output view, a notification line, and a status
//! bar. The file picker is drawn as a popup on top.

mod input;
#[cfg(test)]
mod test_support;
mod theme;

pub use input::{InputPump, apply_event, handle_events};
pub use theme::{Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use cmdpad_engine::{App, InputMode, Phase, Severity, sanitize_terminal_text};

const TAB_WIDTH: usize = 4;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
    let options = app.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);
    // Clear with background color
    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1),      // Title
            Constraint::Percentage(50), // Editor
            Constraint::Min(3),         // Output
            Constraint::Length(1),      // Notification
            Constraint::Length(1),      // Status bar
        ])
        .split(frame.area());

    draw_title(frame, app, chunks[0], &palette);
    draw_editor(frame, app, chunks[1], &palette, &glyphs);
    draw_output(frame, app, chunks[2], &palette, &glyphs);
    draw_notification(frame, app, chunks[3], &palette, &glyphs);
    draw_status_bar(frame, app, chunks[4], &palette);

    if app.input_mode() == InputMode::FileSelect {
        draw_file_picker(frame, app, &palette, &glyphs);
    }
}

fn draw_title(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let mut spans = vec![
        Span::styled(
            " cmdpad ",
            Style::default()
                .fg(palette.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", app.endpoint()),
            Style::default().fg(palette.text_muted),
        ),
    ];
    if let Some(name) = app.pending_file().and_then(|path| path.file_name()) {
        spans.push(Span::styled(
            format!("  reading {}...", sanitize_terminal_text(&name.to_string_lossy())),
            Style::default().fg(palette.warning),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Text as it is shown in the editor: control characters stripped and
/// tabs expanded.
fn display_text(raw: &str) -> String {
    sanitize_terminal_text(raw)
        .replace('\r', "")
        .replace('\t', &" ".repeat(TAB_WIDTH))
}

/// One gutter row: the right-aligned line number and the rule.
fn gutter_label(label: usize, width: usize, rule: &str) -> String {
    format!("{label:>width$} {rule}")
}

fn draw_editor(frame: &mut Frame, app: &mut App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let mode = app.input_mode();
    let loading = app.is_loading();

    let border_style = if mode == InputMode::Insert {
        Style::default().fg(palette.success)
    } else {
        Style::default().fg(palette.bg_border)
    };
    let button = if loading {
        Span::styled(
            format!(" {} Running... ", glyphs.running),
            Style::default()
                .fg(palette.warning)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" [x] Execute ", styles::key_highlight(palette))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .title(Span::styled(
            " Command ",
            Style::default().fg(palette.text_secondary),
        ))
        .title_top(Line::from(button).right_aligned());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let height = inner.height as usize;
    app.set_editor_viewport(height);

    let line_sync = app.line_sync();
    let width = line_sync.index().label_width();
    let gutter_width = (width + 2) as u16;

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(gutter_width), Constraint::Min(1)])
        .split(inner);

    // The gutter reads its own offset, which mirrors the editor's.
    let gutter: Vec<Line> = line_sync
        .visible_labels(height)
        .map(|label| {
            Line::from(Span::styled(
                gutter_label(label, width, glyphs.gutter_rule),
                Style::default().fg(palette.text_muted),
            ))
        })
        .collect();
    frame.render_widget(Paragraph::new(gutter), columns[0]);

    let editor = app.editor();
    let text_style = if loading {
        Style::default().fg(palette.text_disabled)
    } else {
        Style::default().fg(palette.text_primary)
    };

    let lines: Vec<Line> = if editor.text().is_empty() && mode != InputMode::Insert {
        vec![Line::from(Span::styled(
            "Press i to type a command, o to load a .txt file",
            Style::default()
                .fg(palette.text_muted)
                .add_modifier(Modifier::ITALIC),
        ))]
    } else {
        editor
            .text()
            .split('\n')
            .skip(editor.scroll_top())
            .take(height)
            .map(|line| Line::from(Span::styled(display_text(line), text_style)))
            .collect()
    };
    frame.render_widget(Paragraph::new(lines), columns[1]);

    if app.insert_token().is_some() {
        let (line, _) = editor.cursor_line_col();
        if let Some(row) = line.checked_sub(editor.scroll_top())
            && row < height
        {
            let text_area = columns[1];
            let col = display_text(editor.cursor_line_prefix()).width() as u16;
            let x = text_area
                .x
                .saturating_add(col)
                .min(text_area.right().saturating_sub(1));
            frame.set_cursor_position((x, text_area.y + row as u16));
        }
    }
}

fn draw_output(frame: &mut Frame, app: &mut App, area: Rect, palette: &Palette, glyphs: &Glyphs) {
    let phase = app.phase();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.bg_border))
        .title(Span::styled(
            " Output ",
            Style::default().fg(palette.text_secondary),
        ))
        .title_top(
            Line::from(Span::styled(
                format!(" {} ", phase.label()),
                styles::phase(palette, phase),
            ))
            .right_aligned(),
        );
    let inner = block.inner(area);

    if phase == Phase::Loading {
        app.update_output_scroll_max(0);
        let spinner = spinner_frame(app.tick_count(), app.ui_options());
        let processing = Line::from(Span::styled(
            format!("{spinner} Processing..."),
            Style::default().fg(palette.warning),
        ));
        frame.render_widget(Paragraph::new(processing).block(block), area);
        return;
    }

    let text_style = match phase {
        Phase::Failed => Style::default().fg(palette.error),
        _ => Style::default().fg(palette.text_primary),
    };
    // Output comes from the network; never let it drive the terminal.
    let safe = sanitize_terminal_text(app.output_text());
    let lines: Vec<Line> = safe
        .split('\n')
        .map(|line| Line::from(Span::styled(display_text(line), text_style)))
        .collect();

    let total_lines = wrapped_line_count(&lines, inner.width);
    app.update_output_scroll_max(total_lines.saturating_sub(inner.height));

    let output = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.output_scroll(), 0));
    frame.render_widget(output, area);
}

fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total: u16 = 0;

    for line in lines {
        let line_width = line.width();
        let rows = if line_width == 0 {
            1
        } else {
            ((line_width - 1) / width) + 1
        };
        total = total.saturating_add(rows as u16);
    }

    total
}

fn draw_notification(
    frame: &mut Frame,
    app: &App,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let Some(notification) = app.notification() else {
        return;
    };
    let icon = match notification.severity() {
        Severity::Success => glyphs.success,
        Severity::Error => glyphs.error,
        Severity::Info => glyphs.info,
    };
    let style = styles::severity(palette, notification.severity());
    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), style),
        Span::styled(
            sanitize_terminal_text(notification.text()).into_owned(),
            Style::default().fg(palette.text_primary),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn key_hints(mode: InputMode, palette: &Palette) -> Vec<Span<'static>> {
    let pairs: &[(&str, &str)] = match mode {
        InputMode::Normal => &[
            ("i", " edit  "),
            ("x", " execute  "),
            ("o", " open  "),
            ("c", " clear  "),
            ("j/k", " scroll  "),
            ("q", " quit "),
        ],
        InputMode::Insert => &[
            ("Ctrl+R", " execute  "),
            ("Esc", " normal "),
        ],
        InputMode::FileSelect => &[
            ("↑↓", " select  "),
            ("Tab", " file type  "),
            ("Enter", " open  "),
            ("Esc", " cancel "),
        ],
    };
    pairs
        .iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(*key, styles::key_highlight(palette)),
                Span::styled(*label, styles::key_hint(palette)),
            ]
        })
        .collect()
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect, palette: &Palette) {
    let mode = app.input_mode();
    let (mode_label, mode_style) = match mode {
        InputMode::Normal => ("NORMAL", styles::mode_normal(palette)),
        InputMode::Insert => ("INSERT", styles::mode_insert(palette)),
        InputMode::FileSelect => ("OPEN", styles::mode_file_select(palette)),
    };

    let mut spans = vec![
        Span::styled(format!(" {mode_label} "), mode_style),
        Span::raw(" "),
    ];
    spans.extend(key_hints(mode, palette));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    let index = app.line_sync().index();
    let (line, col) = app.editor().cursor_line_col();
    let position = format!("Ln {}, Col {} · {} lines ", line + 1, col + 1, index.count());
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(position, styles::key_hint(palette))).right_aligned()),
        area,
    );
}

/// Centered rectangle of at most `width` x `height` inside `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_file_picker(frame: &mut Frame, app: &App, palette: &Palette, glyphs: &Glyphs) {
    let picker = app.file_picker();
    let files = picker.visible_files();

    let list_rows = files.len().max(1) as u16;
    let popup = centered_rect(64, list_rows + 6, frame.area());
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.primary))
        .style(Style::default().bg(palette.bg_popup))
        .title(Span::styled(
            " Open file ",
            Style::default()
                .fg(palette.text_primary)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(popup).inner(Margin {
        vertical: 0,
        horizontal: 1,
    });
    frame.render_widget(block, popup);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Filter: ", Style::default().fg(palette.text_muted)),
            Span::styled(
                sanitize_terminal_text(picker.filter()).into_owned(),
                Style::default().fg(palette.text_primary),
            ),
        ]),
        Line::from(vec![
            Span::styled("Type:   ", Style::default().fg(palette.text_muted)),
            Span::styled(picker.accept().label(), Style::default().fg(palette.accent)),
        ]),
        Line::from(""),
    ];

    if picker.is_scanning() {
        lines.push(Line::from(Span::styled(
            "Scanning...",
            Style::default().fg(palette.warning),
        )));
    } else if files.is_empty() {
        lines.push(Line::from(Span::styled(
            "No matching files",
            Style::default().fg(palette.text_muted),
        )));
    }
    for (idx, file) in files.iter().enumerate() {
        let selected = idx == picker.selected();
        let prefix = if selected { glyphs.selected } else { " " };
        let style = if selected {
            Style::default()
                .fg(palette.text_primary)
                .bg(palette.bg_highlight)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.text_secondary)
        };
        lines.push(Line::from(Span::styled(
            format!("{prefix} {}", sanitize_terminal_text(&file.display)),
            style,
        )));
    }

    lines.push(Line::from(Span::styled(
        format!("{} of {} files", files.len(), picker.total_count()),
        Style::default().fg(palette.text_muted),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}
