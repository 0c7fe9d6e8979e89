//! Document model: styled lines, the per-kind style table, and the
//! background image payload.
//!
//! A [`DocumentSpec`] is the complete input to the layout engine: a title,
//! an ordered sequence of [`StyledLine`]s, and an optional pre-decoded
//! background image. The sequence order always matches the line order of the
//! normalized source text — the normalizer never reorders, splits, merges,
//! or deduplicates lines, and the layout engine draws them in exactly this
//! order.
//!
//! The style table ([`style_for`]) is a pure, process-lifetime-constant
//! mapping from [`LineKind`] to font, size, alignment, and trailing spacing.

use image::GenericImageView;
use serde::{Deserialize, Serialize};

/// Rendering role of one body line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineKind {
    /// Full-line heading (was wrapped in bold markers or an ATX prefix).
    Heading,
    /// Bulleted line whose text was bold — a labelled key point.
    BulletHeading,
    /// Plain bulleted line.
    Bullet,
    /// Anything else non-empty.
    Paragraph,
}

/// One line of body text tagged with its rendering role.
///
/// `content` is fully stripped: no bold markers, no bullet markers. The
/// canonical bullet glyph is re-attached at draw time for the bullet kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyledLine {
    pub content: String,
    pub kind: LineKind,
}

impl StyledLine {
    pub fn new(kind: LineKind, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }
}

/// The complete input to the layout engine for one generation request.
#[derive(Debug, Clone)]
pub struct DocumentSpec {
    /// Rendered once, centered, at [`TITLE_SIZE`].
    pub title: String,
    /// Body lines in source order.
    pub lines: Vec<StyledLine>,
    /// Optional full-page watermark behind the text.
    pub background: Option<BackgroundImage>,
}

// ── Style table ──────────────────────────────────────────────────────────

/// Base-14 font used for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Font {
    Helvetica,
    HelveticaBold,
}

impl Font {
    /// PostScript base font name, as written into the PDF font dictionary.
    pub fn base_name(self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
        }
    }
}

/// Horizontal alignment of a drawn text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    Center,
    /// Word-spacing-justified; the last wrapped line stays left-aligned.
    Justify,
}

/// How one [`LineKind`] is drawn: font, size, alignment, and the vertical
/// gap that follows, in line-height units of `size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub alignment: Alignment,
    pub spacing_after: f32,
}

/// Title font size in points (always [`Font::HelveticaBold`], centered).
pub const TITLE_SIZE: f32 = 22.0;

/// Vertical gap after the title, in title line heights.
pub const TITLE_GAP: f32 = 1.5;

/// The single canonical bullet glyph. Detection and rendering both use this
/// one marker; the corrupted multi-byte sequence seen in legacy output is
/// gone.
pub const BULLET: char = '•';

/// Look up the constant style for a line kind.
pub const fn style_for(kind: LineKind) -> TextStyle {
    match kind {
        LineKind::Heading => TextStyle {
            font: Font::HelveticaBold,
            size: 14.0,
            alignment: Alignment::Left,
            spacing_after: 0.7,
        },
        LineKind::BulletHeading => TextStyle {
            font: Font::HelveticaBold,
            size: 12.0,
            alignment: Alignment::Left,
            spacing_after: 0.3,
        },
        LineKind::Bullet => TextStyle {
            font: Font::Helvetica,
            size: 12.0,
            alignment: Alignment::Left,
            spacing_after: 0.3,
        },
        LineKind::Paragraph => TextStyle {
            font: Font::Helvetica,
            size: 12.0,
            alignment: Alignment::Justify,
            spacing_after: 0.5,
        },
    }
}

// ── Background image ─────────────────────────────────────────────────────

/// A raster image decoded and validated at the source boundary, ready for
/// embedding. Preparing it here keeps the layout engine infallible: bad
/// bytes degrade to "no image" before a `DocumentSpec` ever exists.
#[derive(Clone)]
pub enum BackgroundImage {
    /// JPEG kept as-is and embedded via DCT pass-through.
    Jpeg {
        data: Vec<u8>,
        width: u32,
        height: u32,
        /// Single-channel source; embedded with a grayscale color space.
        grayscale: bool,
    },
    /// PNG decoded to raw RGB (plus alpha when any pixel is translucent).
    Png {
        rgb: Vec<u8>,
        alpha: Option<Vec<u8>>,
        width: u32,
        height: u32,
    },
}

impl BackgroundImage {
    /// Decode downloaded bytes into an embeddable image.
    ///
    /// Accepts JPEG and PNG. Anything else (or undecodable data served with
    /// a lying content type) is an error the caller degrades on.
    pub fn decode(bytes: &[u8]) -> Result<Self, String> {
        let format = image::guess_format(bytes).map_err(|e| e.to_string())?;
        match format {
            image::ImageFormat::Jpeg => {
                let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
                let (width, height) = decoded.dimensions();
                let grayscale = matches!(
                    decoded.color(),
                    image::ColorType::L8
                        | image::ColorType::L16
                        | image::ColorType::La8
                        | image::ColorType::La16
                );
                Ok(BackgroundImage::Jpeg {
                    data: bytes.to_vec(),
                    width,
                    height,
                    grayscale,
                })
            }
            image::ImageFormat::Png => {
                let decoded = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
                let rgba = decoded.to_rgba8();
                let (width, height) = (rgba.width(), rgba.height());
                let has_alpha = rgba.pixels().any(|p| p.0[3] < 255);
                let rgb: Vec<u8> = rgba.pixels().flat_map(|p| [p.0[0], p.0[1], p.0[2]]).collect();
                let alpha = has_alpha.then(|| rgba.pixels().map(|p| p.0[3]).collect());
                Ok(BackgroundImage::Png {
                    rgb,
                    alpha,
                    width,
                    height,
                })
            }
            other => Err(format!("unsupported image format {other:?}")),
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            BackgroundImage::Jpeg { width, height, .. } => (*width, *height),
            BackgroundImage::Png { width, height, .. } => (*width, *height),
        }
    }
}

// Pixel buffers are noise in debug output; log shape instead.
impl std::fmt::Debug for BackgroundImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        match self {
            BackgroundImage::Jpeg { data, grayscale, .. } => f
                .debug_struct("BackgroundImage::Jpeg")
                .field("bytes", &data.len())
                .field("width", &w)
                .field("height", &h)
                .field("grayscale", grayscale)
                .finish(),
            BackgroundImage::Png { alpha, .. } => f
                .debug_struct("BackgroundImage::Png")
                .field("width", &w)
                .field("height", &h)
                .field("has_alpha", &alpha.is_some())
                .finish(),
        }
    }
}
