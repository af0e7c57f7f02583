//! Terminal text sanitization.
//!
//! Result lines come from a remote service and are written straight into the
//! output panel. Terminal emulators act on escape sequences (clipboard
//! writes, hyperlinks, cursor movement), so untrusted text is filtered
//! before it reaches the frame.

use std::borrow::Cow;

const ESC: char = '\x1b';
const BEL: char = '\x07';
const C1_CSI: char = '\u{009b}';

/// Where the scanner is inside an escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    Text,
    /// Just saw ESC.
    Escape,
    /// CSI parameters until a final byte in `0x40..=0x7e`.
    Csi,
    /// OSC payload until BEL or ST.
    Osc,
    /// DCS/PM/APC payload until ST.
    StringSeq,
    /// ESC seen inside an OSC/DCS payload; `\` completes ST.
    StringEsc { osc: bool },
    /// Two-byte designator (`ESC ( B` and friends): drop one more char.
    Designator,
}

/// Strip ANSI escape sequences and control characters except `\n`, `\t`
/// and `\r`. Borrows when the input is already clean.
#[must_use]
pub fn sanitize_terminal_text(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_unsafe) {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut scan = Scan::Text;

    for c in input.chars() {
        scan = match scan {
            Scan::Text => match c {
                ESC => Scan::Escape,
                C1_CSI => Scan::Csi,
                '\n' | '\t' | '\r' => {
                    out.push(c);
                    Scan::Text
                }
                c if is_control(c) => Scan::Text,
                c => {
                    out.push(c);
                    Scan::Text
                }
            },
            Scan::Escape => match c {
                '[' => Scan::Csi,
                ']' => Scan::Osc,
                'P' | '^' | '_' => Scan::StringSeq,
                '(' | ')' | '*' | '+' | '#' | ' ' => Scan::Designator,
                // Single-character commands (ESC 7, ESC c, ...) and unknown
                // sequences both end here.
                _ => Scan::Text,
            },
            Scan::Csi => match c {
                '\x40'..='\x7e' => Scan::Text,
                '\x20'..='\x3f' => Scan::Csi,
                c => {
                    if !is_control(c) {
                        out.push(c);
                    }
                    Scan::Text
                }
            },
            Scan::Osc => match c {
                BEL => Scan::Text,
                ESC => Scan::StringEsc { osc: true },
                _ => Scan::Osc,
            },
            Scan::StringSeq => match c {
                ESC => Scan::StringEsc { osc: false },
                _ => Scan::StringSeq,
            },
            Scan::StringEsc { osc } => match c {
                '\\' => Scan::Text,
                _ if osc => Scan::Osc,
                _ => Scan::StringSeq,
            },
            Scan::Designator => Scan::Text,
        };
    }

    Cow::Owned(out)
}

fn is_control(c: char) -> bool {
    c <= '\x1f' || c == '\x7f' || ('\u{0080}'..='\u{009f}').contains(&c)
}

fn is_unsafe(c: char) -> bool {
    is_control(c) && !matches!(c, '\n' | '\t' | '\r')
}
