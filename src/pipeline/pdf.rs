//! Low-level PDF surface: pages, cursor, text blocks, background art.
//!
//! ## Why a hand-held cursor?
//!
//! The layout engine thinks in terms of "draw this block, then leave this
//! much room", never in terms of pages. [`PdfSurface`] owns the translation:
//! it keeps a vertical cursor on an A4 page and starts a fresh page whenever
//! the next line would cross the bottom margin. Callers cannot overflow a
//! page and cannot observe page boundaries other than through
//! [`PdfSurface::page_count`].
//!
//! Output is deliberately plain PDF: base-14 Helvetica referenced by name
//! (no font embedding), Flate-compressed content streams, and one optional
//! image XObject shared by every reference to it. Transparency for the
//! backdrop goes through ExtGState alpha entries, deduplicated per distinct
//! opacity.

use std::mem;

use miniz_oxide::deflate::compress_to_vec_zlib;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str};

use crate::document::{Alignment, BackgroundImage, Font};
use crate::pipeline::fonts::{encode_winansi, text_width, LEADING};

// ── Page geometry ────────────────────────────────────────────────────────

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
/// Uniform margin on all four sides.
pub const MARGIN: f32 = 50.0;
/// Horizontal room available to text blocks.
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const FONT_REGULAR: Name<'static> = Name(b"F1");
const FONT_BOLD: Name<'static> = Name(b"F2");
const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// An in-progress PDF document with automatic pagination.
pub struct PdfSurface {
    pdf: Pdf,
    next_ref: i32,
    catalog_id: Ref,
    pages_id: Ref,
    font_regular: Ref,
    font_bold: Ref,
    /// Quantized opacity (percent) to ExtGState object, in creation order.
    alpha_states: Vec<(u8, Ref)>,
    /// Background XObject, once registered.
    image: Option<Ref>,
    page_ids: Vec<Ref>,
    finished_streams: Vec<Vec<u8>>,
    content: Content,
    /// Top of the next line box, in points from the page bottom.
    y: f32,
}

impl PdfSurface {
    pub fn new() -> Self {
        let mut next_ref = 1;
        let mut alloc = || {
            let r = Ref::new(next_ref);
            next_ref += 1;
            r
        };
        let catalog_id = alloc();
        let pages_id = alloc();
        let font_regular = alloc();
        let font_bold = alloc();
        let first_page = alloc();
        Self {
            pdf: Pdf::new(),
            next_ref,
            catalog_id,
            pages_id,
            font_regular,
            font_bold,
            alpha_states: Vec::new(),
            image: None,
            page_ids: vec![first_page],
            finished_streams: Vec::new(),
            content: Content::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn alloc(&mut self) -> Ref {
        let r = Ref::new(self.next_ref);
        self.next_ref += 1;
        r
    }

    /// Pages emitted so far, counting the one in progress.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    // ── Pagination ───────────────────────────────────────────────────────

    fn start_new_page(&mut self) {
        let raw = mem::replace(&mut self.content, Content::new()).finish();
        self.finished_streams.push(raw.into_vec());
        let id = self.alloc();
        self.page_ids.push(id);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.start_new_page();
        }
    }

    /// Move the cursor down without drawing. May leave the cursor past the
    /// bottom margin; the next text line then opens a new page.
    pub fn advance(&mut self, dy: f32) {
        self.y -= dy;
    }

    // ── Transparency ─────────────────────────────────────────────────────

    /// ExtGState name for the given opacity, creating the state on first use.
    fn alpha_state(&mut self, opacity: f32) -> String {
        let key = (opacity.clamp(0.0, 1.0) * 100.0).round() as u8;
        if let Some(idx) = self.alpha_states.iter().position(|(k, _)| *k == key) {
            return format!("GS{idx}");
        }
        let r = self.alloc();
        let value = f32::from(key) / 100.0;
        self.pdf
            .ext_graphics(r)
            .non_stroking_alpha(value)
            .stroking_alpha(value);
        self.alpha_states.push((key, r));
        format!("GS{}", self.alpha_states.len() - 1)
    }

    // ── Background art ───────────────────────────────────────────────────

    /// Draw a decoded image stretched across the whole current page at the
    /// given opacity. The XObject is written once and reused on re-draw.
    pub fn draw_background(&mut self, image: &BackgroundImage, opacity: f32) {
        let image_ref = match self.image {
            Some(r) => r,
            None => self.register_image(image),
        };
        self.image = Some(image_ref);

        let gs = self.alpha_state(opacity);
        self.content.save_state();
        self.content.set_parameters(Name(gs.as_bytes()));
        self.content
            .transform([PAGE_WIDTH, 0.0, 0.0, PAGE_HEIGHT, 0.0, 0.0]);
        self.content.x_object(IMAGE_NAME);
        self.content.restore_state();
    }

    fn register_image(&mut self, image: &BackgroundImage) -> Ref {
        let image_ref = self.alloc();
        match image {
            BackgroundImage::Jpeg {
                data,
                width,
                height,
                grayscale,
            } => {
                let mut xobj = self.pdf.image_xobject(image_ref, data);
                xobj.filter(Filter::DctDecode);
                xobj.width(*width as i32);
                xobj.height(*height as i32);
                xobj.bits_per_component(8);
                if *grayscale {
                    xobj.color_space().device_gray();
                } else {
                    xobj.color_space().device_rgb();
                }
                xobj.finish();
            }
            BackgroundImage::Png {
                rgb,
                alpha,
                width,
                height,
            } => {
                let mask_ref = alpha.as_ref().map(|_| self.alloc());
                let compressed = compress_to_vec_zlib(rgb, 6);
                let mut xobj = self.pdf.image_xobject(image_ref, &compressed);
                xobj.filter(Filter::FlateDecode);
                xobj.width(*width as i32);
                xobj.height(*height as i32);
                xobj.bits_per_component(8);
                xobj.color_space().device_rgb();
                if let Some(m) = mask_ref {
                    xobj.s_mask(m);
                }
                xobj.finish();

                if let (Some(alpha_bytes), Some(m)) = (alpha, mask_ref) {
                    let compressed_alpha = compress_to_vec_zlib(alpha_bytes, 6);
                    let mut mask = self.pdf.image_xobject(m, &compressed_alpha);
                    mask.filter(Filter::FlateDecode);
                    mask.width(*width as i32);
                    mask.height(*height as i32);
                    mask.bits_per_component(8);
                    mask.color_space().device_gray();
                    mask.finish();
                }
            }
        }
        image_ref
    }

    /// Fill the whole current page with white at the given opacity. Used to
    /// knock back the backdrop so body text stays legible on top of it.
    pub fn paint_overlay(&mut self, opacity: f32) {
        let gs = self.alpha_state(opacity);
        self.content.save_state();
        self.content.set_parameters(Name(gs.as_bytes()));
        self.content.set_fill_rgb(1.0, 1.0, 1.0);
        self.content.rect(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT);
        self.content.fill_nonzero();
        self.content.restore_state();
    }

    // ── Text ─────────────────────────────────────────────────────────────

    /// Draw a block of text, wrapping at the content width and breaking
    /// pages as needed. Returns nothing the caller must track; the cursor
    /// ends just below the last line drawn.
    pub fn draw_text_block(&mut self, text: &str, font: Font, size: f32, align: Alignment) {
        let lines = wrap_text(text, font, size, CONTENT_WIDTH);
        let count = lines.len();
        for (i, line) in lines.iter().enumerate() {
            let line_height = size * LEADING;
            self.ensure_room(line_height);
            let natural = text_width(line, font, size);
            let (x, word_spacing) = match align {
                Alignment::Left => (MARGIN, 0.0),
                Alignment::Center => {
                    (MARGIN + ((CONTENT_WIDTH - natural) / 2.0).max(0.0), 0.0)
                }
                Alignment::Justify => {
                    let spaces = line.bytes().filter(|b| *b == b' ').count();
                    let last = i + 1 == count;
                    if last || spaces == 0 || natural >= CONTENT_WIDTH {
                        (MARGIN, 0.0)
                    } else {
                        (MARGIN, (CONTENT_WIDTH - natural) / spaces as f32)
                    }
                }
            };
            let baseline = self.y - size;
            self.show_line(line, font, size, x, baseline, word_spacing);
            self.y -= line_height;
        }
    }

    fn show_line(
        &mut self,
        text: &str,
        font: Font,
        size: f32,
        x: f32,
        baseline: f32,
        word_spacing: f32,
    ) {
        if text.is_empty() {
            return;
        }
        let encoded = encode_winansi(text);
        let name = match font {
            Font::Helvetica => FONT_REGULAR,
            Font::HelveticaBold => FONT_BOLD,
        };
        self.content.begin_text();
        self.content.set_font(name, size);
        if word_spacing != 0.0 {
            self.content.set_word_spacing(word_spacing);
        }
        self.content.next_line(x, baseline);
        self.content.show(Str(&encoded));
        if word_spacing != 0.0 {
            self.content.set_word_spacing(0.0);
        }
        self.content.end_text();
    }

    // ── Assembly ─────────────────────────────────────────────────────────

    /// Close the document and return the serialized PDF.
    pub fn finish(mut self) -> Vec<u8> {
        let raw = mem::replace(&mut self.content, Content::new()).finish();
        self.finished_streams.push(raw.into_vec());

        // Content streams, Flate-compressed.
        let mut content_ids = Vec::with_capacity(self.finished_streams.len());
        let streams = mem::take(&mut self.finished_streams);
        for raw in &streams {
            let id = self.alloc();
            let compressed = compress_to_vec_zlib(raw, 6);
            self.pdf.stream(id, &compressed).filter(Filter::FlateDecode);
            content_ids.push(id);
        }

        // Pages, each pointing at the shared resource set.
        for (page_id, content_id) in self.page_ids.iter().zip(&content_ids) {
            let mut page = self.pdf.page(*page_id);
            page.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
            page.parent(self.pages_id);
            page.contents(*content_id);
            let mut resources = page.resources();
            {
                let mut fonts = resources.fonts();
                fonts.pair(FONT_REGULAR, self.font_regular);
                fonts.pair(FONT_BOLD, self.font_bold);
            }
            if !self.alpha_states.is_empty() {
                let mut states = resources.ext_g_states();
                for (idx, (_, r)) in self.alpha_states.iter().enumerate() {
                    let name = format!("GS{idx}");
                    states.pair(Name(name.as_bytes()), *r);
                }
            }
            if let Some(image_ref) = self.image {
                resources.x_objects().pair(IMAGE_NAME, image_ref);
            }
            resources.finish();
            page.finish();
        }

        // Base-14 fonts, referenced by name with WinAnsi text encoding.
        self.pdf
            .type1_font(self.font_regular)
            .base_font(Name(b"Helvetica"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));
        self.pdf
            .type1_font(self.font_bold)
            .base_font(Name(b"Helvetica-Bold"))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        self.pdf
            .pages(self.pages_id)
            .kids(self.page_ids.iter().copied())
            .count(self.page_ids.len() as i32);
        self.pdf.catalog(self.catalog_id).pages(self.pages_id);
        self.pdf.finish()
    }
}

impl Default for PdfSurface {
    fn default() -> Self {
        Self::new()
    }
}

// ── Wrapping ─────────────────────────────────────────────────────────────

/// Greedy word wrap against a width budget. A single word wider than the
/// budget is split at character granularity rather than overflowing.
fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let fits = |line: &str| text_width(line, font, size) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(mem::take(&mut current));
        }
        if fits(word) {
            current = word.to_string();
        } else {
            let mut chunk = String::new();
            for ch in word.chars() {
                chunk.push(ch);
                if !fits(&chunk) && chunk.chars().count() > 1 {
                    chunk.pop();
                    lines.push(mem::replace(&mut chunk, ch.to_string()));
                }
            }
            current = chunk;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_empty_document_is_a_single_page_pdf() {
        let surface = PdfSurface::new();
        assert_eq!(surface.page_count(), 1);
        let bytes = surface.finish();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(contains(&bytes, b"/Count 1"));
    }

    #[test]
    fn test_both_base14_fonts_are_declared() {
        let bytes = PdfSurface::new().finish();
        assert!(contains(&bytes, b"/Helvetica-Bold"));
        assert!(contains(&bytes, b"/Helvetica"));
        assert!(contains(&bytes, b"/WinAnsiEncoding"));
    }

    #[test]
    fn test_long_content_breaks_pages() {
        let mut surface = PdfSurface::new();
        for _ in 0..120 {
            surface.draw_text_block("filler line", Font::Helvetica, 12.0, Alignment::Left);
        }
        assert!(surface.page_count() >= 2, "expected pagination, got one page");
        let pages = surface.page_count();
        let bytes = surface.finish();
        let marker = format!("/Count {pages}");
        assert!(contains(&bytes, marker.as_bytes()));
    }

    #[test]
    fn test_advance_past_bottom_opens_page_on_next_line() {
        let mut surface = PdfSurface::new();
        surface.advance(PAGE_HEIGHT);
        assert_eq!(surface.page_count(), 1);
        surface.draw_text_block("next page", Font::Helvetica, 12.0, Alignment::Left);
        assert_eq!(surface.page_count(), 2);
    }

    #[test]
    fn test_no_image_means_no_image_object() {
        let mut surface = PdfSurface::new();
        surface.paint_overlay(0.7);
        surface.draw_text_block("text only", Font::Helvetica, 12.0, Alignment::Left);
        let bytes = surface.finish();
        assert!(!contains(&bytes, b"/Image"));
    }

    #[test]
    fn test_background_registers_one_image_xobject() {
        let image = BackgroundImage::Png {
            rgb: vec![0u8; 2 * 2 * 3],
            alpha: None,
            width: 2,
            height: 2,
        };
        let mut surface = PdfSurface::new();
        surface.draw_background(&image, 0.2);
        surface.draw_background(&image, 0.2);
        let bytes = surface.finish();
        assert!(contains(&bytes, b"/Image"));
        let occurrences = bytes
            .windows(b"/Subtype /Image".len())
            .filter(|w| *w == b"/Subtype /Image")
            .count();
        assert_eq!(occurrences, 1, "XObject written once, reused on re-draw");
    }

    #[test]
    fn test_translucent_png_gets_a_soft_mask() {
        let image = BackgroundImage::Png {
            rgb: vec![10u8; 3],
            alpha: Some(vec![128u8]),
            width: 1,
            height: 1,
        };
        let mut surface = PdfSurface::new();
        surface.draw_background(&image, 0.2);
        let bytes = surface.finish();
        assert!(contains(&bytes, b"/SMask"));
    }

    #[test]
    fn test_overlay_registers_ext_g_state() {
        let mut surface = PdfSurface::new();
        surface.paint_overlay(0.7);
        let bytes = surface.finish();
        assert!(contains(&bytes, b"/ExtGState"));
    }

    #[test]
    fn test_distinct_opacities_share_and_split_states() {
        let mut surface = PdfSurface::new();
        assert_eq!(surface.alpha_state(0.2), "GS0");
        assert_eq!(surface.alpha_state(0.7), "GS1");
        assert_eq!(surface.alpha_state(0.2), "GS0");
        assert_eq!(surface.alpha_states.len(), 2);
    }

    #[test]
    fn test_wrap_keeps_short_text_on_one_line() {
        let lines = wrap_text("short", Font::Helvetica, 12.0, CONTENT_WIDTH);
        assert_eq!(lines, vec!["short".to_string()]);
    }

    #[test]
    fn test_wrap_splits_on_word_boundaries() {
        let text = "alpha beta gamma delta";
        let lines = wrap_text(text, Font::Helvetica, 12.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(
                text_width(line, Font::Helvetica, 12.0) <= 60.0,
                "line {line:?} exceeds budget"
            );
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_hard_splits_an_overlong_word() {
        let word = "x".repeat(400);
        let lines = wrap_text(&word, Font::Helvetica, 12.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        for line in &lines {
            assert!(text_width(line, Font::Helvetica, 12.0) <= 100.0);
        }
    }

    #[test]
    fn test_wrap_of_empty_text_is_empty() {
        assert!(wrap_text("   ", Font::Helvetica, 12.0, 100.0).is_empty());
    }

    #[test]
    fn test_justified_block_sets_word_spacing() {
        let mut surface = PdfSurface::new();
        let text = "word ".repeat(60);
        surface.draw_text_block(&text, Font::Helvetica, 12.0, Alignment::Justify);
        let raw = mem::replace(&mut surface.content, Content::new()).finish();
        assert!(contains(&raw, b"Tw"), "expected a word-spacing operator");
    }
}
