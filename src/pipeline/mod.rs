//! Pipeline stages for topic-to-PDF generation.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the page sink) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! normalize ──▶ layout ──▶ pdf
//! (classify)   (compose)  (pages/bytes)
//! ```
//!
//! 1. [`normalize`] — classify raw generated text into styled lines and
//!    strip the lightweight markup
//! 2. [`fonts`]     — WinAnsi encoding plus Helvetica metrics; pure data,
//!    shared by layout decisions and the sink
//! 3. [`layout`]    — compose backdrop, overlay, title, and body onto the
//!    page surface in document order
//! 4. [`pdf`]       — the page sink itself: cursor, wrapping, pagination,
//!    and final serialization
//!
//! Fetching text and images is *not* a pipeline stage; the [`crate::source`]
//! providers run before the pipeline and feed it plain data.

pub mod fonts;
pub mod layout;
pub mod normalize;
pub mod pdf;
