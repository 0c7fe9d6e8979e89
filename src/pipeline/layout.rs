//! Document layout: one [`DocumentSpec`] in, one finished PDF out.
//!
//! The composition order is fixed: backdrop image (when present), the white
//! legibility overlay, the centered title, then every styled line in input
//! order. Backdrop, overlay, and title are drawn exactly once, on the first
//! page; continuation pages carry body text only. Pagination itself lives
//! in [`PdfSurface`], so this module never checks whether anything fits.

use std::borrow::Cow;

use crate::document::{style_for, DocumentSpec, Font, LineKind, StyledLine};
use crate::document::{Alignment, BULLET, TITLE_GAP, TITLE_SIZE};
use crate::pipeline::fonts::LEADING;
use crate::pipeline::pdf::PdfSurface;

/// Backdrop image opacity. Low enough that body text stays readable even
/// before the overlay is painted on top.
pub const BACKGROUND_OPACITY: f32 = 0.2;
/// White overlay opacity, knocking the backdrop back further.
pub const OVERLAY_OPACITY: f32 = 0.7;

/// Render a document to PDF bytes.
pub fn render(doc: &DocumentSpec) -> Vec<u8> {
    compose(doc).finish()
}

/// Compose without serialising, so callers can read the page count first.
pub(crate) fn compose(doc: &DocumentSpec) -> PdfSurface {
    let mut surface = PdfSurface::new();

    if let Some(image) = &doc.background {
        surface.draw_background(image, BACKGROUND_OPACITY);
    }
    surface.paint_overlay(OVERLAY_OPACITY);

    surface.draw_text_block(&doc.title, Font::HelveticaBold, TITLE_SIZE, Alignment::Center);
    surface.advance(TITLE_GAP * TITLE_SIZE * LEADING);

    for line in &doc.lines {
        let style = style_for(line.kind);
        let text = display_text(line);
        surface.draw_text_block(&text, style.font, style.size, style.alignment);
        surface.advance(style.spacing_after * style.size * LEADING);
    }
    surface
}

/// Text as drawn: bulleted kinds get the canonical glyph back, content
/// itself is already marker-free.
fn display_text(line: &StyledLine) -> Cow<'_, str> {
    match line.kind {
        LineKind::Bullet | LineKind::BulletHeading => {
            Cow::Owned(format!("{BULLET} {}", line.content))
        }
        LineKind::Heading | LineKind::Paragraph => Cow::Borrowed(&line.content),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
