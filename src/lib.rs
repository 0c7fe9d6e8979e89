//! # topic2pdf
//!
//! Turn a topic into a styled, paginated PDF brief using live content APIs.
//!
//! ## Why this crate?
//!
//! Producing a presentable document about a subject normally means three
//! manual steps: research the content, format it, and export it. This crate
//! collapses them into one call — it fetches topic text from a generative
//! endpoint or a web-search digest, picks an optional backdrop photo,
//! classifies the lightweight Markdown into styled lines, and lays the result
//! out as an A4 PDF. Content APIs are flaky; a failed fetch degrades to a
//! placeholder or a plain background instead of failing the document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic
//!  │
//!  ├─ 1. Fetch      article from Gemini, or a Custom Search snippet digest
//!  │                (+ optional backdrop photo from Unsplash / image search)
//!  ├─ 2. Normalize  classify Markdown into heading / bullet / paragraph lines
//!  ├─ 3. Lay out    backdrop, white overlay, centered title, styled body
//!  └─ 4. Emit       paginated A4 PDF, written atomically to the output dir
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use topic2pdf::{generate_to_file, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Text provider auto-detected from GOOGLE_API_KEY, or
//!     // GOOGLE_SEARCH_API_KEY + GOOGLE_CX for the digest fallback
//!     let config = GenerationConfig::default();
//!     let output = generate_to_file("Artificial Intelligence", &config).await?;
//!     println!("{}", output.path.display());
//!     eprintln!("{} pages, {} lines", output.stats.pages, output.stats.lines);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `topic2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! topic2pdf = { version = "0.3", default-features = false }
//! ```
//!
//! ## Choosing Providers
//!
//! | Provider   | Kind  | Credentials | Yields |
//! |------------|-------|-------------|--------|
//! | `gemini`   | text  | `GOOGLE_API_KEY` | Generated Markdown article (preferred) |
//! | `search`   | text  | `GOOGLE_SEARCH_API_KEY` + `GOOGLE_CX` | Bulleted snippet digest |
//! | `unsplash` | image | `UNSPLASH_ACCESS_KEY` | Landscape backdrop photo (preferred) |
//! | `search`   | image | `GOOGLE_SEARCH_API_KEY` + `GOOGLE_CX` | First image hit |
//!
//! Under `Auto` (the default) the preferred provider with credentials wins.
//! No image credentials at all means documents simply render without a
//! backdrop; no *text* credentials is a configuration error, reported as
//! [`GenerateError::NoTextProvider`] before any network call.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod source;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder, ImageProvider, TextProvider};
pub use document::{BackgroundImage, DocumentSpec, LineKind, StyledLine};
pub use error::{GenerateError, SourceError};
pub use generate::{
    generate, generate_many, generate_sync, generate_to_file, output_filename, GeneratedPdf,
    GenerationOutput, GenerationStats, TopicResult,
};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use source::{ImageSource, TextSource};
pub use stream::{generate_stream, TopicStream};
