//! Font metrics for the standard Helvetica faces
//!
//! Widths come from the Adobe core font metrics (1/1000 em) for the
//! printable ASCII range. Characters outside it are measured with the
//! width of a digit, which is also the width Helvetica uses for most
//! Latin-1 letters and currency signs.

use crate::encoding::winansi_byte;

/// Standard fonts available to every document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    /// Resource name used inside content streams
    pub(crate) fn resource_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "F1",
            Self::HelveticaBold => "F2",
        }
    }

    /// PostScript name of the standard font
    pub(crate) fn base_font(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    fn widths(&self) -> &'static [u16; 95] {
        match self {
            Self::Helvetica => &HELVETICA,
            Self::HelveticaBold => &HELVETICA_BOLD,
        }
    }

    /// Advance width of one character in 1/1000 em
    fn char_width(&self, c: char) -> u16 {
        match winansi_byte(c) {
            Some(b @ 32..=126) => self.widths()[(b - 32) as usize],
            _ => DEFAULT_WIDTH,
        }
    }
}

const DEFAULT_WIDTH: u16 = 556;

/// Line spacing relative to font size
const LINE_SPACING: f32 = 1.2;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    333, 333, 584, 584, 584, 611, 975,
    // A-Z
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    333, 278, 333, 584, 556, 333,
    // a-z
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    // { | } ~
    389, 280, 389, 584,
];

/// Width of `s` in points at the given font size
pub fn text_width(font: Font, size: f32, s: &str) -> f32 {
    let units: u32 = s.chars().map(|c| font.char_width(c) as u32).sum();
    units as f32 * size / 1000.0
}

/// Distance between two baselines at the given font size
pub fn line_height(size: f32) -> f32 {
    size * LINE_SPACING
}

/// Greedy word wrap to `max_width`
///
/// Explicit newlines start a new line. Words wider than the box are broken
/// between characters. Always returns at least one line, so empty text
/// still occupies a line of height.
pub fn wrap_text(font: Font, size: f32, s: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in s.split('\n') {
        let mut current = String::new();

        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if text_width(font, size, &candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if text_width(font, size, word) <= max_width {
                current = word.to_string();
            } else {
                // Hard-break an oversized word
                for c in word.chars() {
                    let mut next = current.clone();
                    next.push(c);
                    if !current.is_empty() && text_width(font, size, &next) > max_width {
                        lines.push(std::mem::take(&mut current));
                        current.push(c);
                    } else {
                        current = next;
                    }
                }
            }
        }

        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Truncate `s` to fit within `max_width`, appending "..." when shortened
pub fn truncate_to_width(font: Font, size: f32, s: &str, max_width: f32) -> String {
    if text_width(font, size, s) <= max_width {
        return s.to_string();
    }

    const ELLIPSIS: &str = "...";
    let budget = max_width - text_width(font, size, ELLIPSIS);
    let mut width = 0.0;
    let mut result = String::new();
    for c in s.chars() {
        let w = font.char_width(c) as f32 * size / 1000.0;
        if width + w > budget {
            break;
        }
        result.push(c);
        width += w;
    }
    result.push_str(ELLIPSIS);
    result
}
