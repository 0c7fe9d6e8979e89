//! Metrics and encoding for the built-in Helvetica fonts.
//!
//! ## Why built-in fonts?
//!
//! The renderer only ever uses Helvetica and Helvetica-Bold, two of the
//! standard fonts every PDF viewer must supply. Referencing them by name
//! keeps the output files small (no embedded font program) and sidesteps
//! licensing entirely. The trade-off is that *we* still need advance widths
//! to make layout decisions: line wrapping, centering, and justification
//! all require measuring text before a viewer ever sees it. The tables
//! below are the standard Adobe AFM widths, in thousandths of an em.
//!
//! Text is shown through `WinAnsiEncoding` (cp1252), which covers ASCII,
//! Latin-1, and the Windows punctuation block, including the `•` bullet at
//! 0x95. Characters outside that repertoire are replaced with `?` both when
//! encoding and when measuring, so the measured width always matches what
//! ends up in the content stream.

use crate::document::Font;

/// Baseline-to-baseline distance as a multiple of the font size.
pub const LEADING: f32 = 1.15;

// ── WinAnsi (cp1252) encoding ────────────────────────────────────────────

/// Map a character to its WinAnsi code point, if it has one.
pub fn winansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        '\u{0000}'..='\u{007F}' => ch as u8,
        '\u{00A0}'..='\u{00FF}' => ch as u8,
        // cp1252 additions in the 0x80..0x9F window.
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Encode text as WinAnsi bytes, substituting `?` for anything unmappable.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| winansi_byte(ch).unwrap_or(b'?'))
        .collect()
}

// ── Advance widths ───────────────────────────────────────────────────────

/// Helvetica widths for printable ASCII (0x20..=0x7E), per-mille of an em.
#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold widths for printable ASCII (0x20..=0x7E).
#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Advance width of one WinAnsi code point, per-mille of an em.
///
/// ASCII comes from the AFM tables above. The cp1252 punctuation window
/// carries the exact AFM values for the glyphs [`winansi_byte`] can emit.
/// Accented Latin-1 letters share the width of a typical lowercase letter;
/// the error is at most a few per-mille and only shifts wrap points, since
/// the viewer renders from its own exact metrics.
fn glyph_width(font: Font, code: u8) -> u16 {
    if (0x20..=0x7E).contains(&code) {
        let idx = (code - 0x20) as usize;
        return match font {
            Font::Helvetica => HELVETICA_ASCII[idx],
            Font::HelveticaBold => HELVETICA_BOLD_ASCII[idx],
        };
    }
    let bold = matches!(font, Font::HelveticaBold);
    match code {
        0x80 | 0x83 | 0x86 | 0x87 | 0x96 => 556,
        0x82 | 0x91 | 0x92 => {
            if bold {
                278
            } else {
                222
            }
        }
        0x84 | 0x93 | 0x94 => {
            if bold {
                500
            } else {
                333
            }
        }
        0x85 | 0x89 | 0x8C | 0x97 | 0x99 => 1000,
        0x88 | 0x8B | 0x98 | 0x9B => 333,
        0x8A | 0x9F => 667,
        0x8E => 611,
        0x95 => 350,
        0x9A | 0x9E => {
            if bold {
                556
            } else {
                500
            }
        }
        0x9C => 944,
        0xA0 => 278,
        _ => {
            if bold {
                611
            } else {
                556
            }
        }
    }
}

/// Width of a string at the given size, in points.
///
/// Measures the WinAnsi encoding of `text`, so unmappable characters count
/// as the `?` they will be shown as.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let milli: u32 = text
        .chars()
        .map(|ch| winansi_byte(ch).unwrap_or(b'?'))
        .map(|code| u32::from(glyph_width(font, code)))
        .sum();
    milli as f32 * size / 1000.0
}

// ── Tests ────────────────────────────────────────────────────────────────
