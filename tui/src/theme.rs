//! Color theme and glyphs for cmdpad TUI.
//!
//! Uses Kanagawa Wave palette by default with an optional high-contrast override.

use ratatui::style::{Color, Modifier, Style};

use cmdpad_engine::UiOptions;

/// Kanagawa Wave color palette constants.
mod colors {
    use super::Color;

    // === Backgrounds (Sumi Ink) ===
    pub const BG_DARK: Color = Color::Rgb(22, 22, 29); // sumiInk0
    pub const BG_PANEL: Color = Color::Rgb(31, 31, 40); // sumiInk3
    pub const BG_HIGHLIGHT: Color = Color::Rgb(42, 42, 55); // sumiInk4
    pub const BG_POPUP: Color = Color::Rgb(54, 54, 70); // sumiInk5
    pub const BG_BORDER: Color = Color::Rgb(84, 84, 109); // sumiInk6

    // === Foregrounds (Fuji) ===
    pub const TEXT_PRIMARY: Color = Color::Rgb(220, 215, 186); // fujiWhite
    pub const TEXT_SECONDARY: Color = Color::Rgb(200, 192, 147); // oldWhite
    pub const TEXT_MUTED: Color = Color::Rgb(114, 113, 105); // fujiGray
    pub const TEXT_DISABLED: Color = Color::Rgb(113, 124, 124); // katanaGray

    pub const PRIMARY: Color = Color::Rgb(149, 127, 184); // oniViolet

    // === Accent Colors ===
    pub const BLUE: Color = Color::Rgb(126, 156, 216); // crystalBlue
    pub const CYAN: Color = Color::Rgb(127, 180, 202); // springBlue
    pub const GREEN: Color = Color::Rgb(152, 187, 108); // springGreen
    pub const YELLOW: Color = Color::Rgb(230, 195, 132); // carpYellow
    pub const ORANGE: Color = Color::Rgb(255, 160, 102); // surimiOrange
    pub const RED: Color = Color::Rgb(255, 93, 98); // peachRed
}

/// Resolved theme palette used by the UI.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_dark: Color,
    pub bg_panel: Color,
    pub bg_highlight: Color,
    pub bg_popup: Color,
    pub bg_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_muted: Color,
    pub text_disabled: Color,
    pub primary: Color,
    pub accent: Color,
    pub info: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub peach: Color,
}

impl Palette {
    #[must_use]
    pub fn standard() -> Self {
        Self {
            bg_dark: colors::BG_DARK,
            bg_panel: colors::BG_PANEL,
            bg_highlight: colors::BG_HIGHLIGHT,
            bg_popup: colors::BG_POPUP,
            bg_border: colors::BG_BORDER,
            text_primary: colors::TEXT_PRIMARY,
            text_secondary: colors::TEXT_SECONDARY,
            text_muted: colors::TEXT_MUTED,
            text_disabled: colors::TEXT_DISABLED,
            primary: colors::PRIMARY,
            accent: colors::CYAN,
            info: colors::BLUE,
            success: colors::GREEN,
            warning: colors::YELLOW,
            error: colors::RED,
            peach: colors::ORANGE,
        }
    }

    #[must_use]
    pub fn high_contrast() -> Self {
        Self {
            bg_dark: Color::Black,
            bg_panel: Color::Black,
            bg_highlight: Color::DarkGray,
            bg_popup: Color::Black,
            bg_border: Color::Gray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            text_muted: Color::DarkGray,
            text_disabled: Color::DarkGray,
            primary: Color::White,
            accent: Color::Cyan,
            info: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            peach: Color::Yellow,
        }
    }
}

#[must_use]
pub fn palette(options: UiOptions) -> Palette {
    if options.high_contrast {
        Palette::high_contrast()
    } else {
        Palette::standard()
    }
}

/// ASCII/Unicode glyphs for icons and spinners.
#[derive(Debug, Clone, Copy)]
pub struct Glyphs {
    pub success: &'static str,
    pub error: &'static str,
    pub info: &'static str,
    pub running: &'static str,
    pub selected: &'static str,
    pub gutter_rule: &'static str,
    pub spinner_frames: &'static [&'static str],
}

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_FRAMES_ASCII: &[&str] = &["|", "/", "-", "\\"];

#[must_use]
pub fn glyphs(options: UiOptions) -> Glyphs {
    if options.ascii_only {
        Glyphs {
            success: "OK",
            error: "ERR",
            info: "i",
            running: ">",
            selected: ">",
            gutter_rule: "|",
            spinner_frames: SPINNER_FRAMES_ASCII,
        }
    } else {
        Glyphs {
            success: "✓",
            error: "✗",
            info: "•",
            running: "▶",
            selected: "▸",
            gutter_rule: "│",
            spinner_frames: SPINNER_FRAMES,
        }
    }
}

#[must_use]
pub fn spinner_frame(tick: usize, options: UiOptions) -> &'static str {
    let frames = glyphs(options).spinner_frames;
    frames[tick % frames.len()]
}

/// Pre-defined styles for common UI elements.
pub mod styles {
    use cmdpad_engine::{Phase, Severity};

    use super::{Modifier, Palette, Style};

    #[must_use]
    pub fn mode_normal(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.bg_dark)
            .bg(palette.text_secondary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn mode_insert(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.bg_dark)
            .bg(palette.success)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn mode_file_select(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.bg_dark)
            .bg(palette.primary)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_hint(palette: &Palette) -> Style {
        Style::default().fg(palette.text_muted)
    }

    #[must_use]
    pub fn key_highlight(palette: &Palette) -> Style {
        Style::default()
            .fg(palette.peach)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn severity(palette: &Palette, severity: Severity) -> Style {
        let color = match severity {
            Severity::Success => palette.success,
            Severity::Error => palette.error,
            Severity::Info => palette.info,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn phase(palette: &Palette, phase: Phase) -> Style {
        let color = match phase {
            Phase::Idle => palette.text_muted,
            Phase::Loading => palette.warning,
            Phase::Succeeded => palette.success,
            Phase::Failed => palette.error,
        };
        Style::default().fg(color)
    }
}

#[cfg(test)]
mod tests {
    use cmdpad_engine::UiOptions;

    use super::{glyphs, spinner_frame};

    #[test]
    fn spinner_frame_cycles() {
        let options = UiOptions::default();
        assert_ne!(spinner_frame(0, options), spinner_frame(1, options));
        assert_eq!(spinner_frame(0, options), spinner_frame(10, options));
    }

    #[test]
    fn ascii_glyphs_are_ascii() {
        let options = UiOptions {
            ascii_only: true,
            high_contrast: false,
        };
        let g = glyphs(options);
        for glyph in [g.success, g.error, g.info, g.running, g.selected, g.gutter_rule] {
            assert!(glyph.is_ascii(), "{glyph:?} should be ASCII");
        }
        assert!(g.spinner_frames.iter().all(|f| f.is_ascii()));
    }
}
