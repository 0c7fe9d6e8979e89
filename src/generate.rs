//! Eager (whole-document) generation entry points.
//!
//! ## Why eager vs. streaming?
//!
//! This module provides the simpler API: fetch, normalize, lay out, and (for
//! the `_to_file` variants) write — then return. Each call handles exactly one
//! topic and holds the finished PDF in memory before handing it back. Use
//! [`crate::stream::generate_stream`] instead when you run many topics and
//! want each result as soon as it completes.

use crate::config::{GenerationConfig, ImageProvider, TextProvider};
use crate::document::{BackgroundImage, DocumentSpec};
use crate::error::{GenerateError, SourceError};
use crate::pipeline::{layout, normalize};
use crate::source::{GeminiSource, ImageSource, SearchSource, TextSource, UnsplashSource};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Counters and degradation flags for one generated topic.
///
/// A degraded field carries the absorbed [`SourceError`]; `None` means the
/// fetch succeeded (or, for the image, that no provider was configured).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Pages in the finished PDF.
    pub pages: usize,
    /// Styled lines the normalizer produced (the title is not a line).
    pub lines: usize,
    /// Set when the text fetch failed and the placeholder was rendered.
    pub text_degraded: Option<SourceError>,
    /// Set when the image fetch or decode failed and the document rendered
    /// without its backdrop.
    pub image_degraded: Option<SourceError>,
    /// Wall-clock time for the whole request.
    pub total_duration_ms: u64,
}

/// In-memory result of [`generate`]: the finished PDF plus the document it
/// was rendered from.
pub struct GeneratedPdf {
    /// The topic, trimmed.
    pub topic: String,
    /// Complete PDF file content.
    pub bytes: Vec<u8>,
    /// The normalized document, for callers that want the styled lines.
    pub document: DocumentSpec,
    /// Counters and degradation flags.
    pub stats: GenerationStats,
}

// Elides the raw bytes; a multi-megabyte hexdump helps nobody.
impl fmt::Debug for GeneratedPdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedPdf")
            .field("topic", &self.topic)
            .field("bytes", &format!("{} bytes", self.bytes.len()))
            .field("document", &self.document)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Summary of one topic written to disk by [`generate_to_file`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// The topic, trimmed.
    pub topic: String,
    /// Where the PDF landed.
    pub path: PathBuf,
    /// Counters and degradation flags.
    pub stats: GenerationStats,
}

/// Per-topic outcome from [`generate_many`] or
/// [`crate::stream::generate_stream`].
#[derive(Debug)]
pub struct TopicResult {
    pub topic: String,
    pub result: Result<GenerationOutput, GenerateError>,
}

/// Generate a styled PDF for a topic, in memory.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `topic`  — Subject of the document; becomes the title and the prompt
/// * `config` — Generation configuration
///
/// # Returns
/// `Ok(GeneratedPdf)` whenever a document could be produced — including when
/// a content fetch failed and the placeholder text or a missing backdrop was
/// rendered instead (check `stats.text_degraded` / `stats.image_degraded`).
///
/// # Errors
/// Returns `Err(GenerateError)` only for fatal errors:
/// - Empty topic
/// - No usable text provider (no key configured anywhere)
/// - Invalid provider selection (e.g. `unsplash` chosen without its key)
pub async fn generate(
    topic: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GeneratedPdf, GenerateError> {
    let total_start = Instant::now();
    let topic = topic.as_ref().trim();
    if topic.is_empty() {
        return Err(GenerateError::EmptyTopic);
    }
    info!("Starting generation: {}", topic);

    // ── Step 1: Resolve content sources ──────────────────────────────────
    let text_source = resolve_text_source(config)?;
    let image_source = resolve_image_source(config)?;
    debug!(
        "Using text source '{}', image source {:?}",
        text_source.name(),
        image_source.as_ref().map(|s| s.name())
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_topic_start(topic);
    }

    // ── Step 2: Fetch text (degrades, never fails) ───────────────────────
    let fetch_start = Instant::now();
    let (raw_text, text_degraded) = match text_source.fetch_text(topic).await {
        Ok(text) => (text, None),
        Err(e) => {
            warn!("Text fetch from '{}' degraded: {}", text_source.name(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_source_degraded(topic, &e);
            }
            (text_source.placeholder().to_string(), Some(e))
        }
    };
    debug!(
        "Fetched {} chars in {}ms",
        raw_text.len(),
        fetch_start.elapsed().as_millis()
    );

    // ── Step 3: Fetch the backdrop (optional, degrades to none) ──────────
    let (background, image_degraded) = match image_source {
        Some(source) => fetch_background(source.as_ref(), topic, config).await,
        None => (None, None),
    };

    // ── Step 4: Normalize into styled lines ──────────────────────────────
    let lines = normalize::normalize(&raw_text, topic);
    debug!("Normalized into {} styled lines", lines.len());

    // ── Step 5: Lay out and serialise ────────────────────────────────────
    let document = DocumentSpec {
        title: topic.to_string(),
        lines,
        background,
    };
    let surface = layout::compose(&document);
    let pages = surface.page_count();
    let bytes = surface.finish();

    // ── Step 6: Summarise ────────────────────────────────────────────────
    let stats = GenerationStats {
        pages,
        lines: document.lines.len(),
        text_degraded,
        image_degraded,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Generation complete: {} pages, {} lines, {}ms",
        stats.pages, stats.lines, stats.total_duration_ms
    );

    Ok(GeneratedPdf {
        topic: topic.to_string(),
        bytes,
        document,
        stats,
    })
}

/// Generate a topic PDF and write it into `config.output_dir`.
///
/// The file name is derived from the topic by [`output_filename`], and the
/// write is atomic (temp file + rename) so readers never observe a partial
/// PDF. The output directory is created, including parents, if absent.
pub async fn generate_to_file(
    topic: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GenerationOutput, GenerateError> {
    let generated = generate(topic, config).await?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| GenerateError::OutputDirFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    let path = config.output_dir.join(output_filename(&generated.topic));

    // Atomic write: write to temp, then rename
    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &generated.bytes)
        .await
        .map_err(|e| GenerateError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(|e| GenerateError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        })?;

    info!(
        "Wrote {} ({} pages)",
        path.display(),
        generated.stats.pages
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_topic_complete(&generated.topic, generated.stats.pages);
    }

    Ok(GenerationOutput {
        topic: generated.topic,
        path,
        stats: generated.stats,
    })
}

/// Generate PDFs for several topics concurrently.
///
/// Topics run through [`generate_to_file`] with at most `config.concurrency`
/// in flight; each is an independent request, so one failing leaves the rest
/// untouched. Results come back in input order regardless of completion
/// order. Batch-level progress events (`on_batch_start`, `on_topic_error`,
/// `on_batch_complete`) fire only from this function.
pub async fn generate_many(
    topics: &[impl AsRef<str>],
    config: &GenerationConfig,
) -> Vec<TopicResult> {
    let total = topics.len();
    info!("Starting batch generation of {} topics", total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut indexed: Vec<(usize, TopicResult)> =
        stream::iter(topics.iter().enumerate().map(|(idx, topic)| {
            let topic = topic.as_ref().to_string();
            let config = config.clone();
            async move {
                let result = generate_to_file(&topic, &config).await;
                if let Err(ref e) = result {
                    warn!("Topic '{}' failed: {}", topic, e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_topic_error(&topic, &e.to_string());
                    }
                }
                (idx, TopicResult { topic, result })
            }
        }))
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await;

    // Completion order is arbitrary; report in input order.
    indexed.sort_by_key(|(idx, _)| *idx);
    let results: Vec<TopicResult> = indexed.into_iter().map(|(_, r)| r).collect();

    let succeeded = results.iter().filter(|r| r.result.is_ok()).count();
    info!("Batch complete: {}/{} topics succeeded", succeeded, total);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    results
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally; do not call from within an
/// async context.
pub fn generate_sync(
    topic: impl AsRef<str>,
    config: &GenerationConfig,
) -> Result<GeneratedPdf, GenerateError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| GenerateError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(topic, config))
}

/// Derive the output file name for a topic.
///
/// Whitespace runs collapse into a single `_`, and path separators are
/// replaced so the file always lands inside the output directory:
/// `"Artificial Intelligence"` → `"Artificial_Intelligence.pdf"`.
pub fn output_filename(topic: &str) -> String {
    let mut name = String::with_capacity(topic.len() + 4);
    let mut in_gap = false;
    for ch in topic.trim().chars() {
        if ch.is_whitespace() {
            in_gap = true;
            continue;
        }
        if in_gap {
            name.push('_');
            in_gap = false;
        }
        name.push(if std::path::is_separator(ch) { '_' } else { ch });
    }
    name.push_str(".pdf");
    name
}

// ── Provider resolution ──────────────────────────────────────────────────

/// Resolve the text source, from most-specific to least-specific.
///
/// The fallback chain lets library users and CLI users each set exactly as
/// much or as little as they need:
///
/// 1. **Pre-built source** (`config.text_source`) — the caller constructed
///    the source entirely; we use it as-is. The seam for tests and custom
///    backends.
///
/// 2. **Explicit provider** (`config.text_provider` ≠ `Auto`) — the caller
///    named a provider; missing credentials are an error rather than a
///    silent switch to something they did not ask for.
///
/// 3. **Auto-detection** — the generative endpoint when its key is present
///    (config field first, then `GOOGLE_API_KEY`), else the search digest
///    (`GOOGLE_SEARCH_API_KEY` + `GOOGLE_CX`), else a configuration error.
fn resolve_text_source(config: &GenerationConfig) -> Result<Arc<dyn TextSource>, GenerateError> {
    // 1) User-provided source takes priority
    if let Some(ref source) = config.text_source {
        return Ok(Arc::clone(source));
    }

    let google_key = key_or_env(&config.google_api_key, "GOOGLE_API_KEY");
    let search_key = key_or_env(&config.google_search_api_key, "GOOGLE_SEARCH_API_KEY");
    let engine_id = key_or_env(&config.google_cx, "GOOGLE_CX");

    match config.text_provider {
        // 2) Explicit choice
        TextProvider::Generative => {
            let key = google_key.ok_or_else(|| GenerateError::NoTextProvider {
                hint: "The generative provider needs an API key. \
                       Set GOOGLE_API_KEY or GenerationConfig::google_api_key."
                    .to_string(),
            })?;
            gemini_source(key, config)
        }
        TextProvider::Search => match (search_key, engine_id) {
            (Some(key), Some(cx)) => search_text_source(key, cx, config),
            _ => Err(GenerateError::NoTextProvider {
                hint: "The search provider needs GOOGLE_SEARCH_API_KEY and GOOGLE_CX \
                       (or the matching config fields)."
                    .to_string(),
            }),
        },
        // 3) Auto-detection: generative first, search digest second
        TextProvider::Auto => {
            if let Some(key) = google_key {
                return gemini_source(key, config);
            }
            if let (Some(key), Some(cx)) = (search_key, engine_id) {
                return search_text_source(key, cx, config);
            }
            Err(GenerateError::NoTextProvider {
                hint: "Set GOOGLE_API_KEY for generated articles, or \
                       GOOGLE_SEARCH_API_KEY + GOOGLE_CX for search digests."
                    .to_string(),
            })
        }
    }
}

/// Resolve the image source. `Ok(None)` means "render without a backdrop" —
/// under `Auto` a missing image provider is never an error, only an explicit
/// selection without credentials is.
fn resolve_image_source(
    config: &GenerationConfig,
) -> Result<Option<Arc<dyn ImageSource>>, GenerateError> {
    if let Some(ref source) = config.image_source {
        return Ok(Some(Arc::clone(source)));
    }

    let unsplash_key = key_or_env(&config.unsplash_access_key, "UNSPLASH_ACCESS_KEY");
    let search_key = key_or_env(&config.google_search_api_key, "GOOGLE_SEARCH_API_KEY");
    let engine_id = key_or_env(&config.google_cx, "GOOGLE_CX");

    match config.image_provider {
        ImageProvider::None => Ok(None),
        ImageProvider::Unsplash => {
            let key = unsplash_key.ok_or_else(|| {
                GenerateError::InvalidConfig(
                    "Image provider 'unsplash' selected but no access key is configured \
                     (UNSPLASH_ACCESS_KEY)"
                        .to_string(),
                )
            })?;
            unsplash_source(key, config).map(Some)
        }
        ImageProvider::Search => match (search_key, engine_id) {
            (Some(key), Some(cx)) => search_image_source(key, cx, config).map(Some),
            _ => Err(GenerateError::InvalidConfig(
                "Image provider 'search' selected but GOOGLE_SEARCH_API_KEY / GOOGLE_CX \
                 are not configured"
                    .to_string(),
            )),
        },
        ImageProvider::Auto => {
            if let Some(key) = unsplash_key {
                return unsplash_source(key, config).map(Some);
            }
            if let (Some(key), Some(cx)) = (search_key, engine_id) {
                return search_image_source(key, cx, config).map(Some);
            }
            Ok(None)
        }
    }
}

/// Config value if non-blank, else the environment variable if non-blank.
fn key_or_env(configured: &Option<String>, var: &str) -> Option<String> {
    if let Some(value) = configured {
        if !value.trim().is_empty() {
            return Some(value.clone());
        }
    }
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

// A failed HTTP client build is an environment problem (TLS backend), not a
// degradation, so it surfaces as a fatal error.
fn gemini_source(
    key: String,
    config: &GenerationConfig,
) -> Result<Arc<dyn TextSource>, GenerateError> {
    let source = GeminiSource::new(key, config.model.clone(), config.request_timeout_secs)
        .map_err(|e| GenerateError::Internal(format!("HTTP client construction failed: {}", e)))?;
    Ok(Arc::new(source))
}

fn search_text_source(
    key: String,
    cx: String,
    config: &GenerationConfig,
) -> Result<Arc<dyn TextSource>, GenerateError> {
    let source = SearchSource::new(key, cx, config.snippet_limit, config.request_timeout_secs)
        .map_err(|e| GenerateError::Internal(format!("HTTP client construction failed: {}", e)))?;
    Ok(Arc::new(source))
}

fn search_image_source(
    key: String,
    cx: String,
    config: &GenerationConfig,
) -> Result<Arc<dyn ImageSource>, GenerateError> {
    let source = SearchSource::new(key, cx, config.snippet_limit, config.request_timeout_secs)
        .map_err(|e| GenerateError::Internal(format!("HTTP client construction failed: {}", e)))?;
    Ok(Arc::new(source))
}

fn unsplash_source(
    key: String,
    config: &GenerationConfig,
) -> Result<Arc<dyn ImageSource>, GenerateError> {
    let source = UnsplashSource::new(key, config.request_timeout_secs)
        .map_err(|e| GenerateError::Internal(format!("HTTP client construction failed: {}", e)))?;
    Ok(Arc::new(source))
}

// ── Fetch helpers ────────────────────────────────────────────────────────

/// Fetch and decode the backdrop, absorbing every failure into "no image".
async fn fetch_background(
    source: &dyn ImageSource,
    topic: &str,
    config: &GenerationConfig,
) -> (Option<BackgroundImage>, Option<SourceError>) {
    let bytes = match source.fetch_image(topic).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Image fetch from '{}' degraded: {}", source.name(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_source_degraded(topic, &e);
            }
            return (None, Some(e));
        }
    };

    match BackgroundImage::decode(&bytes) {
        Ok(image) => {
            let (w, h) = image.dimensions();
            debug!("Backdrop decoded: {}x{}", w, h);
            (Some(image), None)
        }
        Err(detail) => {
            let e = SourceError::BadImage {
                provider: source.name().to_string(),
                detail,
            };
            warn!("Backdrop from '{}' degraded: {}", source.name(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_source_degraded(topic, &e);
            }
            (None, Some(e))
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
