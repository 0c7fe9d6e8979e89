//! Line classification: raw generated text → ordered styled lines.
//!
//! ## Why classify instead of parse?
//!
//! The text providers return *lightweight* markup — bold wrappers, ATX
//! heading prefixes, bullet prefixes — sprinkled by a language model or
//! assembled from search snippets. It is not reliable Markdown: markers go
//! unclosed, heading levels vary between replies, and bullets arrive with
//! whatever glyph the upstream produced. A full Markdown parser would reject
//! or "fix" such input; this module instead classifies each physical line
//! into exactly one [`LineKind`] and strips the decoration, so the layout
//! engine only ever sees clean text plus a role tag.
//!
//! The classifier is total: nothing here returns an error. A line that
//! matches no markup rule is a paragraph, which makes malformed markup a
//! styling question rather than a failure mode.
//!
//! ## Rule order
//!
//! Rules run top-to-bottom per line and the first match wins: the
//! duplicate-title drop must precede everything (it removes lines other
//! rules would happily classify), the ATX rewrite must precede the bold-line
//! rule it feeds, and the bullet-with-bold rule must precede the plain
//! bullet rule it specialises.

use crate::document::{LineKind, StyledLine};
use once_cell::sync::Lazy;
use regex::Regex;

/// Normalize raw generated text into styled lines.
///
/// Applied per physical line, in order:
/// 1. Trim surrounding whitespace; drop the line if empty.
/// 2. Drop the line if it exactly equals `**{topic}**` (case-insensitive) —
///    it duplicates the separately rendered title.
/// 3. Rewrite an ATX heading prefix (`#`–`######` + space) into a heading.
/// 4. A line fully wrapped in bold markers → [`LineKind::Heading`].
/// 5. A bullet marker (`-` or `•`) followed by bold markers →
///    [`LineKind::BulletHeading`].
/// 6. A bullet marker followed by plain text → [`LineKind::Bullet`].
/// 7. Anything else → [`LineKind::Paragraph`].
///
/// Bold markers never survive into `content` — not as wrappers and not
/// inline — and neither do bullet markers; a line reduced to nothing by
/// stripping is dropped like a blank one. Lines are never split, merged, or
/// reordered, so output position corresponds one-to-one to the surviving
/// input lines.
pub fn normalize(input: &str, topic: &str) -> Vec<StyledLine> {
    input
        .lines()
        .filter_map(|line| classify_line(line, topic))
        .collect()
}

// ── Rule 2: duplicate title drop ─────────────────────────────────────────

fn is_duplicate_title(trimmed: &str, topic: &str) -> bool {
    trimmed
        .strip_prefix("**")
        .and_then(|rest| rest.strip_suffix("**"))
        .map(|inner| inner.trim().to_lowercase() == topic.trim().to_lowercase())
        .unwrap_or(false)
}

// ── Rule 3: ATX heading prefix ───────────────────────────────────────────

static RE_ATX_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+(.*)$").unwrap());

// ── Rules 4–6: bold line, bulleted bold, plain bullet ────────────────────

static RE_BOLD_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\*\*(.+)\*\*$").unwrap());
static RE_BULLET_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-•]\s+\*\*.+?\*\*").unwrap());
static RE_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-•](\s+|$)").unwrap());

/// Classify one physical line, or `None` when the line produces no output.
fn classify_line(line: &str, topic: &str) -> Option<StyledLine> {
    let trimmed = line.trim();
    if trimmed.is_empty() || is_duplicate_title(trimmed, topic) {
        return None;
    }

    let (kind, content) = if let Some(caps) = RE_ATX_HEADING.captures(trimmed) {
        let rest = caps.get(1).map_or("", |m| m.as_str());
        (LineKind::Heading, strip_bold_markers(rest))
    } else if let Some(caps) = RE_BOLD_LINE.captures(trimmed) {
        let inner = caps.get(1).map_or("", |m| m.as_str());
        (LineKind::Heading, strip_bold_markers(inner))
    } else if RE_BULLET_BOLD.is_match(trimmed) {
        let rest = RE_BULLET.replace(trimmed, "");
        (LineKind::BulletHeading, strip_bold_markers(&rest))
    } else if RE_BULLET.is_match(trimmed) {
        let rest = RE_BULLET.replace(trimmed, "");
        (LineKind::Bullet, strip_bold_markers(&rest))
    } else {
        (LineKind::Paragraph, strip_bold_markers(trimmed))
    };

    if content.is_empty() {
        return None;
    }
    Some(StyledLine { content, kind })
}

/// Remove every bold marker, wrapper or inline, and re-trim.
fn strip_bold_markers(s: &str) -> String {
    s.replace("**", "").trim().to_string()
}

// ── Tests ────────────────────────────────────────────────────────────────
