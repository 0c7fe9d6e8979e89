//! Configuration types for topic-to-PDF generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The struct is immutable once built and
//! passed explicitly into provider resolution and the generation functions —
//! nothing reads ambient global state at render time, which keeps concurrent
//! requests independent and configs trivial to share across tasks.
//!
//! # Design choice: builder over constructor
//! A ten-field constructor is unreadable and breaks on every new field. The
//! builder lets callers set only what they care about and rely on documented
//! defaults for the rest.

use crate::error::GenerateError;
use crate::progress::ProgressCallback;
use crate::source::{ImageSource, TextSource};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for generating topic PDFs.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use topic2pdf::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gemini-pro")
///     .snippet_limit(3)
///     .output_dir("out/pdfs")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// API key for the generative-text endpoint.
    /// Falls back to the `GOOGLE_API_KEY` env var at resolution time.
    pub google_api_key: Option<String>,

    /// API key for Custom Search (text digest and image search).
    /// Falls back to the `GOOGLE_SEARCH_API_KEY` env var at resolution time.
    pub google_search_api_key: Option<String>,

    /// Custom Search engine identifier (`cx` parameter).
    /// Falls back to the `GOOGLE_CX` env var at resolution time.
    pub google_cx: Option<String>,

    /// Access key for Unsplash image search.
    /// Falls back to the `UNSPLASH_ACCESS_KEY` env var at resolution time.
    pub unsplash_access_key: Option<String>,

    /// Explicit text source instance. When set, provider resolution is
    /// skipped entirely and this source is used as-is. This is the main seam
    /// for tests and for callers bringing their own backend.
    pub text_source: Option<Arc<dyn TextSource>>,

    /// Explicit image source instance, with the same override semantics as
    /// [`Self::text_source`].
    pub image_source: Option<Arc<dyn ImageSource>>,

    /// Which text provider to use. Default: [`TextProvider::Auto`].
    ///
    /// `Auto` prefers the generative endpoint when its key is present and
    /// falls back to the search digest; resolution fails only when neither
    /// family has credentials.
    pub text_provider: TextProvider,

    /// Which image provider to use. Default: [`ImageProvider::Auto`].
    ///
    /// `Auto` prefers Unsplash when its key is present, then Custom Search
    /// image mode, then no image at all. A missing image is never an error —
    /// the document renders without its background.
    pub image_provider: ImageProvider,

    /// Generative model identifier. Default: `"gemini-pro"`.
    pub model: String,

    /// Directory the PDF files are written into. Default: `"pdfs"`.
    /// Created (including parents) if absent.
    pub output_dir: PathBuf,

    /// Per-request HTTP timeout in seconds. Default: 30.
    ///
    /// Applies to every content-API call and to the image download. A fetch
    /// that times out degrades to its placeholder; it never fails the
    /// request, so a generous value only delays degraded output.
    pub request_timeout_secs: u64,

    /// Maximum search snippets folded into the text digest. Range: 1–10.
    /// Default: 5.
    ///
    /// Custom Search returns at most 10 results per call; five bulleted
    /// snippets fill roughly half an A4 page, which reads as a summary
    /// rather than a dump. Raise it for denser briefs.
    pub snippet_limit: usize,

    /// Number of topics generated concurrently by the batch API. Default: 4.
    ///
    /// Each topic is an independent request with its own document and its
    /// own output file, so this only bounds in-flight HTTP work. Sequential
    /// behaviour within one topic is unaffected.
    pub concurrency: usize,

    /// Observer for progress events (topic started, source degraded, PDF
    /// written). Default: `None` — no events are emitted.
    ///
    /// See [`crate::progress::GenerationProgressCallback`] for the event set.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            google_api_key: None,
            google_search_api_key: None,
            google_cx: None,
            unsplash_access_key: None,
            text_source: None,
            image_source: None,
            text_provider: TextProvider::default(),
            image_provider: ImageProvider::default(),
            model: "gemini-pro".to_string(),
            output_dir: PathBuf::from("pdfs"),
            request_timeout_secs: 30,
            snippet_limit: 5,
            concurrency: 4,
            progress_callback: None,
        }
    }
}

// API keys are redacted so a debug-logged config never leaks credentials.
impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(key: &Option<String>) -> &'static str {
            if key.is_some() {
                "<redacted>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("GenerationConfig")
            .field("google_api_key", &redact(&self.google_api_key))
            .field("google_search_api_key", &redact(&self.google_search_api_key))
            .field("google_cx", &redact(&self.google_cx))
            .field("unsplash_access_key", &redact(&self.unsplash_access_key))
            .field("text_source", &self.text_source.as_ref().map(|s| s.name()))
            .field("image_source", &self.image_source.as_ref().map(|s| s.name()))
            .field("text_provider", &self.text_provider)
            .field("image_provider", &self.image_provider)
            .field("model", &self.model)
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("snippet_limit", &self.snippet_limit)
            .field("concurrency", &self.concurrency)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn google_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.google_api_key = Some(key.into());
        self
    }

    pub fn google_search_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.google_search_api_key = Some(key.into());
        self
    }

    pub fn google_cx(mut self, cx: impl Into<String>) -> Self {
        self.config.google_cx = Some(cx.into());
        self
    }

    pub fn unsplash_access_key(mut self, key: impl Into<String>) -> Self {
        self.config.unsplash_access_key = Some(key.into());
        self
    }

    /// Inject a text source directly, bypassing provider resolution.
    pub fn text_source(mut self, source: Arc<dyn TextSource>) -> Self {
        self.config.text_source = Some(source);
        self
    }

    /// Inject an image source directly, bypassing provider resolution.
    pub fn image_source(mut self, source: Arc<dyn ImageSource>) -> Self {
        self.config.image_source = Some(source);
        self
    }

    pub fn text_provider(mut self, provider: TextProvider) -> Self {
        self.config.text_provider = provider;
        self
    }

    pub fn image_provider(mut self, provider: ImageProvider) -> Self {
        self.config.image_provider = provider;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn snippet_limit(mut self, n: usize) -> Self {
        self.config.snippet_limit = n.clamp(1, 10);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    /// Attach a progress callback receiving per-topic and batch events.
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, GenerateError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(GenerateError::InvalidConfig(
                "Model name must not be empty".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(GenerateError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        if c.snippet_limit == 0 || c.snippet_limit > 10 {
            return Err(GenerateError::InvalidConfig(format!(
                "Snippet limit must be 1–10, got {}",
                c.snippet_limit
            )));
        }
        if c.concurrency == 0 {
            return Err(GenerateError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which backend supplies the topic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextProvider {
    /// Generative endpoint if its key is configured, else search digest. (default)
    #[default]
    Auto,
    /// Gemini-style `generateContent` article.
    Generative,
    /// Custom Search snippet digest.
    Search,
}

/// Which backend supplies the optional background image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageProvider {
    /// Unsplash if its key is configured, else Custom Search images, else none. (default)
    #[default]
    Auto,
    /// Unsplash photo search.
    Unsplash,
    /// Custom Search in image mode.
    Search,
    /// Skip the image fetch entirely; documents render without a background.
    None,
}
