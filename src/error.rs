//! Error types for the topic2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`GenerateError`] — **Fatal**: the current request cannot produce a PDF
//!   at all (invalid configuration, no usable provider, output file cannot be
//!   written). Returned as `Err(GenerateError)` from the top-level
//!   `generate*` functions. One request failing never affects a concurrent
//!   sibling request.
//!
//! * [`SourceError`] — **Non-fatal**: a content fetch failed (network blip,
//!   non-success status, empty API reply, undecodable image). Absorbed at the
//!   source boundary: the text degrades to a placeholder sentinel and the
//!   image degrades to "absent", and the document still renders. Stored in
//!   [`crate::generate::GenerationStats`] so callers can see what degraded.
//!
//! Malformed markup is deliberately *not* represented here: the normalizer is
//! total and classifies anything unrecognized as a plain paragraph.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the topic2pdf library.
///
/// Fetch-level failures use [`SourceError`] and are absorbed into
/// placeholders rather than propagated here.
#[derive(Debug, Error)]
pub enum GenerateError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The topic string was empty or whitespace-only.
    #[error("Topic must not be empty")]
    EmptyTopic,

    // ── Provider errors ───────────────────────────────────────────────────
    /// No text provider could be resolved from config or environment.
    #[error("No text provider is configured.\n{hint}")]
    NoTextProvider { hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create, write, or finalise the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal content-fetch error.
///
/// Recorded in [`crate::generate::GenerationStats`] when a fetch degrades.
/// The request continues with a placeholder instead of failing.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SourceError {
    /// The API returned a non-success HTTP status.
    #[error("{provider} returned HTTP {status}: {detail}")]
    Status {
        provider: String,
        status: u16,
        detail: String,
    },

    /// The request failed at the transport level (DNS, TLS, connect, read).
    #[error("{provider} request failed: {detail}")]
    Network { provider: String, detail: String },

    /// The request exceeded the configured timeout.
    #[error("{provider} request timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// The reply body was not the JSON shape the API documents.
    #[error("{provider} reply could not be decoded: {detail}")]
    Decode { provider: String, detail: String },

    /// The API replied, but with nothing usable (no candidates, items, or results).
    #[error("{provider} returned no usable result for '{topic}'")]
    EmptyReply { provider: String, topic: String },

    /// Downloaded image bytes could not be decoded as PNG or JPEG.
    #[error("Image from {provider} could not be decoded: {detail}")]
    BadImage { provider: String, detail: String },
}
