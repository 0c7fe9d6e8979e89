//! End-to-end integration tests for topic2pdf.
//!
//! Most tests here run fully offline: they inject stub content sources
//! through `GenerationConfig` and exercise the whole pipeline from raw text
//! to finished PDF bytes on disk. The tests at the bottom call the live
//! content APIs and are gated behind the `E2E_ENABLED` environment variable
//! plus the matching API keys, so they do not run in CI unless explicitly
//! requested.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture
//!
//! Live APIs:
//!   E2E_ENABLED=1 GOOGLE_API_KEY=... cargo test --test e2e -- --nocapture

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;
use topic2pdf::{
    generate, generate_many, generate_stream, generate_sync, generate_to_file, output_filename,
    GenerateError, GenerationConfig, GenerationProgressCallback, ImageProvider, ImageSource,
    LineKind, SourceError, TextProvider, TextSource,
};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Assert the bytes pass basic PDF structure checks.
fn assert_pdf_quality(bytes: &[u8], context: &str) {
    assert!(
        bytes.starts_with(b"%PDF-"),
        "[{context}] missing PDF header"
    );
    assert!(
        contains(bytes, b"%%EOF"),
        "[{context}] missing end-of-file marker"
    );
    assert!(
        contains(bytes, b"/Helvetica"),
        "[{context}] base font not registered"
    );
    assert!(
        bytes.len() >= 500,
        "[{context}] output suspiciously short: {} bytes",
        bytes.len()
    );
    println!(
        "[{context}] ✓  {} bytes, structure checks passed",
        bytes.len()
    );
}

/// Article the stub text source serves, covering every line kind.
const SAMPLE_ARTICLE: &str = "**Overview**\n\n\
    AI is a field of computer science.\n\n\
    - **Key Point**\n\
    - Fast growth\n";

/// A tiny but valid PNG, as a real image provider would return.
fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([120u8, 90, 60]));
    let mut out = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("png encoding");
    out.into_inner()
}

// ── Stub content sources ─────────────────────────────────────────────────────

struct StubText(String);

impl StubText {
    fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

#[async_trait]
impl TextSource for StubText {
    async fn fetch_text(&self, _topic: &str) -> Result<String, SourceError> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "stub-text"
    }
}

struct FailingText;

#[async_trait]
impl TextSource for FailingText {
    async fn fetch_text(&self, _topic: &str) -> Result<String, SourceError> {
        Err(SourceError::Network {
            provider: "stub-text".to_string(),
            detail: "connection refused".to_string(),
        })
    }
    fn name(&self) -> &'static str {
        "stub-text"
    }
}

struct StubImage(Vec<u8>);

#[async_trait]
impl ImageSource for StubImage {
    async fn fetch_image(&self, _topic: &str) -> Result<Vec<u8>, SourceError> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "stub-image"
    }
}

struct FailingImage;

#[async_trait]
impl ImageSource for FailingImage {
    async fn fetch_image(&self, _topic: &str) -> Result<Vec<u8>, SourceError> {
        Err(SourceError::Status {
            provider: "stub-image".to_string(),
            status: 503,
            detail: "service unavailable".to_string(),
        })
    }
    fn name(&self) -> &'static str {
        "stub-image"
    }
}

/// Config with a stub article, no image source, writing into `dir`.
fn stub_config(dir: &std::path::Path) -> GenerationConfig {
    GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(SAMPLE_ARTICLE)))
        .image_provider(ImageProvider::None)
        .output_dir(dir)
        .build()
        .expect("valid config")
}

// ── Full-pipeline tests (offline, always run) ────────────────────────────────

#[tokio::test]
async fn test_generate_classifies_and_renders() {
    let dir = tempdir().expect("tempdir");
    let config = stub_config(dir.path());

    let out = generate("Artificial Intelligence", &config)
        .await
        .expect("generation should succeed");

    // Line classification in document order.
    let kinds: Vec<LineKind> = out.document.lines.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LineKind::Heading,
            LineKind::Paragraph,
            LineKind::BulletHeading,
            LineKind::Bullet,
        ]
    );
    // Markers are stripped from the stored content.
    assert_eq!(out.document.lines[0].content, "Overview");
    assert_eq!(out.document.lines[2].content, "Key Point");
    assert_eq!(out.document.lines[3].content, "Fast growth");

    assert_eq!(out.document.title, "Artificial Intelligence");
    assert_eq!(out.stats.lines, 4);
    assert_eq!(out.stats.pages, 1);
    assert!(out.stats.text_degraded.is_none());
    assert!(out.stats.image_degraded.is_none());
    assert_pdf_quality(&out.bytes, "classify-and-render");
}

#[tokio::test]
async fn test_topic_duplicate_line_is_dropped() {
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(
            "**Coral Reefs**\n\n**Overview**\n\nReefs host a quarter of marine life.\n",
        )))
        .image_provider(ImageProvider::None)
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Coral Reefs", &config)
        .await
        .expect("generation should succeed");

    // The bold topic line duplicates the title: dropped, not rendered twice.
    assert_eq!(out.stats.lines, 2);
    assert!(out
        .document
        .lines
        .iter()
        .all(|l| l.content != "Coral Reefs"));
    assert_eq!(out.document.lines[0].content, "Overview");
}

#[tokio::test]
async fn test_text_fetch_failure_degrades_to_placeholder() {
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(FailingText))
        .image_provider(ImageProvider::None)
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Rust", &config)
        .await
        .expect("degraded generation still succeeds");

    assert!(matches!(
        out.stats.text_degraded,
        Some(SourceError::Network { .. })
    ));
    assert_eq!(out.document.lines.len(), 1);
    assert_eq!(out.document.lines[0].kind, LineKind::Paragraph);
    assert_eq!(out.document.lines[0].content, "No content generated.");
    assert_pdf_quality(&out.bytes, "placeholder-text");
}

#[tokio::test]
async fn test_image_fetch_failure_renders_without_backdrop() {
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(SAMPLE_ARTICLE)))
        .image_source(Arc::new(FailingImage))
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Rust", &config)
        .await
        .expect("generation should succeed");

    assert!(matches!(
        out.stats.image_degraded,
        Some(SourceError::Status { status: 503, .. })
    ));
    assert!(out.document.background.is_none());
    assert!(
        !contains(&out.bytes, b"/Image"),
        "degraded document must not embed an image XObject"
    );
    assert_pdf_quality(&out.bytes, "no-backdrop");
}

#[tokio::test]
async fn test_stub_image_is_embedded_as_backdrop() {
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(SAMPLE_ARTICLE)))
        .image_source(Arc::new(StubImage(png_bytes())))
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Rust", &config)
        .await
        .expect("generation should succeed");

    assert!(out.stats.image_degraded.is_none());
    assert!(out.document.background.is_some());
    assert!(contains(&out.bytes, b"/Image"));
    assert_pdf_quality(&out.bytes, "with-backdrop");
}

#[tokio::test]
async fn test_undecodable_image_degrades_cleanly() {
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(SAMPLE_ARTICLE)))
        .image_source(Arc::new(StubImage(b"not an image".to_vec())))
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Rust", &config)
        .await
        .expect("generation should succeed");

    assert!(matches!(
        out.stats.image_degraded,
        Some(SourceError::BadImage { .. })
    ));
    assert!(out.document.background.is_none());
}

#[tokio::test]
async fn test_long_article_paginates() {
    let article: String = (0..200)
        .map(|i| format!("Paragraph number {i} filling out the page.\n\n"))
        .collect();
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(article)))
        .image_provider(ImageProvider::None)
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Pagination", &config)
        .await
        .expect("generation should succeed");

    assert_eq!(out.stats.lines, 200);
    assert!(
        out.stats.pages >= 2,
        "200 paragraphs must spill past one A4 page, got {}",
        out.stats.pages
    );
}

#[tokio::test]
async fn test_empty_topic_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let config = stub_config(dir.path());
    let err = generate("   ", &config).await.unwrap_err();
    assert!(matches!(err, GenerateError::EmptyTopic));
}

// ── File sink tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_to_file_derives_name_from_topic() {
    let dir = tempdir().expect("tempdir");
    let config = stub_config(dir.path());

    let out = generate_to_file("Rust Programming Language", &config)
        .await
        .expect("file generation should succeed");

    assert_eq!(
        out.path,
        dir.path().join("Rust_Programming_Language.pdf")
    );
    let bytes = std::fs::read(&out.path).expect("output file readable");
    assert_pdf_quality(&bytes, "to-file");

    // Atomic write leaves no temp file behind.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read output dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == "tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp file left behind: {leftovers:?}");
}

#[tokio::test]
async fn test_output_dir_is_created_on_demand() {
    let dir = tempdir().expect("tempdir");
    let nested = dir.path().join("a/b/c");
    let config = stub_config(&nested);

    let out = generate_to_file("Rust", &config)
        .await
        .expect("file generation should succeed");
    assert!(out.path.starts_with(&nested));
    assert!(out.path.exists());
}

#[tokio::test]
async fn test_sink_failure_leaves_concurrent_topic_untouched() {
    // One config points its output dir *under a regular file*, which makes
    // directory creation fail; the sibling request keeps its own sink.
    let blocker = tempdir().expect("tempdir");
    let occupied = blocker.path().join("occupied");
    std::fs::write(&occupied, b"x").expect("write blocker file");
    let bad_config = stub_config(&occupied.join("sub"));

    let good_dir = tempdir().expect("tempdir");
    let good_config = stub_config(good_dir.path());

    let (bad, good) = tokio::join!(
        generate_to_file("Doomed Topic", &bad_config),
        generate_to_file("Healthy Topic", &good_config),
    );

    assert!(matches!(
        bad.unwrap_err(),
        GenerateError::OutputDirFailed { .. }
    ));
    let out = good.expect("sibling topic must not be affected");
    assert!(out.path.exists());
}

#[test]
fn test_output_filename_derivation() {
    assert_eq!(
        output_filename("Artificial Intelligence"),
        "Artificial_Intelligence.pdf"
    );
    assert_eq!(output_filename("Rust"), "Rust.pdf");
    assert_eq!(output_filename("  spaced   out  "), "spaced_out.pdf");
}

// ── Batch and stream tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_many_reports_in_input_order() {
    let dir = tempdir().expect("tempdir");
    let config = stub_config(dir.path());
    let topics = ["Alpha Topic", "Beta Topic", "Gamma Topic"];

    let results = generate_many(&topics, &config).await;

    assert_eq!(results.len(), 3);
    for (item, expected) in results.iter().zip(topics) {
        assert_eq!(item.topic, expected);
        let out = item.result.as_ref().expect("topic should succeed");
        assert!(out.path.exists());
    }
}

#[tokio::test]
async fn test_generate_many_isolates_failures() {
    let dir = tempdir().expect("tempdir");
    let config = stub_config(dir.path());
    let topics = ["", "Rust Memory Safety"];

    let results = generate_many(&topics, &config).await;

    assert!(matches!(
        results[0].result,
        Err(GenerateError::EmptyTopic)
    ));
    let out = results[1].result.as_ref().expect("valid topic succeeds");
    assert_eq!(out.path, dir.path().join("Rust_Memory_Safety.pdf"));
}

#[tokio::test]
async fn test_generate_stream_yields_every_topic() {
    use futures::StreamExt;

    let dir = tempdir().expect("tempdir");
    let config = stub_config(dir.path());
    let topics = vec![
        "Stream One".to_string(),
        "Stream Two".to_string(),
        "Stream Three".to_string(),
    ];

    let results: Vec<_> = generate_stream(topics.clone(), config).collect().await;

    assert_eq!(results.len(), 3);
    // Completion order is arbitrary; every topic must appear exactly once.
    let mut seen: Vec<&str> = results.iter().map(|r| r.topic.as_str()).collect();
    seen.sort_unstable();
    let mut expected: Vec<&str> = topics.iter().map(|t| t.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(seen, expected);
    assert!(results.iter().all(|r| r.result.is_ok()));
}

#[test]
fn test_generate_sync_from_plain_thread() {
    let dir = tempdir().expect("tempdir");
    let config = stub_config(dir.path());

    let out = generate_sync("Blocking Caller", &config).expect("sync generation should succeed");
    assert_eq!(out.document.title, "Blocking Caller");
    assert_pdf_quality(&out.bytes, "sync");
}

// ── Progress callback tests ──────────────────────────────────────────────────

#[derive(Default)]
struct CountingCallback {
    batch_starts: AtomicUsize,
    topic_starts: AtomicUsize,
    degradations: AtomicUsize,
    completions: AtomicUsize,
    errors: AtomicUsize,
    batch_completes: AtomicUsize,
    last_success_count: AtomicUsize,
}

impl GenerationProgressCallback for CountingCallback {
    fn on_batch_start(&self, _total_topics: usize) {
        self.batch_starts.fetch_add(1, Ordering::SeqCst);
    }
    fn on_topic_start(&self, _topic: &str) {
        self.topic_starts.fetch_add(1, Ordering::SeqCst);
    }
    fn on_source_degraded(&self, _topic: &str, _error: &SourceError) {
        self.degradations.fetch_add(1, Ordering::SeqCst);
    }
    fn on_topic_complete(&self, _topic: &str, _pages: usize) {
        self.completions.fetch_add(1, Ordering::SeqCst);
    }
    fn on_topic_error(&self, _topic: &str, _error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
    fn on_batch_complete(&self, _total_topics: usize, success_count: usize) {
        self.batch_completes.fetch_add(1, Ordering::SeqCst);
        self.last_success_count
            .store(success_count, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_progress_events_fire_per_topic() {
    let counter = Arc::new(CountingCallback::default());
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(SAMPLE_ARTICLE)))
        .image_source(Arc::new(FailingImage))
        .output_dir(dir.path())
        .progress_callback(Arc::clone(&counter) as Arc<dyn GenerationProgressCallback>)
        .build()
        .expect("valid config");

    let topics = ["One", "Two", "Three"];
    let results = generate_many(&topics, &config).await;
    assert!(results.iter().all(|r| r.result.is_ok()));

    assert_eq!(counter.batch_starts.load(Ordering::SeqCst), 1);
    assert_eq!(counter.topic_starts.load(Ordering::SeqCst), 3);
    // Every topic's image fetch degraded exactly once.
    assert_eq!(counter.degradations.load(Ordering::SeqCst), 3);
    assert_eq!(counter.completions.load(Ordering::SeqCst), 3);
    assert_eq!(counter.errors.load(Ordering::SeqCst), 0);
    assert_eq!(counter.batch_completes.load(Ordering::SeqCst), 1);
    assert_eq!(counter.last_success_count.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_progress_error_event_fires_for_failed_topic() {
    let counter = Arc::new(CountingCallback::default());
    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(SAMPLE_ARTICLE)))
        .image_provider(ImageProvider::None)
        .output_dir(dir.path())
        .progress_callback(Arc::clone(&counter) as Arc<dyn GenerationProgressCallback>)
        .build()
        .expect("valid config");

    let topics = ["", "Survivor"];
    let results = generate_many(&topics, &config).await;

    assert!(results[0].result.is_err());
    assert!(results[1].result.is_ok());
    assert_eq!(counter.errors.load(Ordering::SeqCst), 1);
    assert_eq!(counter.completions.load(Ordering::SeqCst), 1);
    assert_eq!(counter.last_success_count.load(Ordering::SeqCst), 1);
}

// ── Provider resolution without credentials ──────────────────────────────────

#[tokio::test]
async fn test_no_text_provider_is_a_config_error() {
    // Only meaningful when the environment carries no real keys.
    if std::env::var("GOOGLE_API_KEY").is_ok() || std::env::var("GOOGLE_SEARCH_API_KEY").is_ok() {
        println!("SKIP — provider keys present in the environment");
        return;
    }

    let config = GenerationConfig::builder()
        .image_provider(ImageProvider::None)
        .build()
        .expect("valid config");
    let err = generate("Rust", &config).await.unwrap_err();
    assert!(matches!(err, GenerateError::NoTextProvider { .. }));
}

// ── Live-API tests (need E2E_ENABLED + keys) ─────────────────────────────────

/// Skip this test unless E2E_ENABLED and every named env var are set.
macro_rules! e2e_skip_unless_ready {
    ($($var:literal),+ $(,)?) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run live-API e2e tests");
            return;
        }
        $(
            if std::env::var($var).is_err() {
                println!("SKIP — {} not set", $var);
                return;
            }
        )+
    }};
}

#[tokio::test]
async fn test_live_gemini_article() {
    e2e_skip_unless_ready!("GOOGLE_API_KEY");

    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_provider(TextProvider::Generative)
        .image_provider(ImageProvider::None)
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Artificial Intelligence", &config)
        .await
        .expect("live generation should succeed");

    assert!(
        out.stats.text_degraded.is_none(),
        "live fetch degraded: {:?}",
        out.stats.text_degraded
    );
    assert!(!out.document.lines.is_empty());
    assert_pdf_quality(&out.bytes, "live-gemini");
    println!(
        "live-gemini: {} lines, {} pages, {}ms",
        out.stats.lines, out.stats.pages, out.stats.total_duration_ms
    );
}

#[tokio::test]
async fn test_live_search_digest() {
    e2e_skip_unless_ready!("GOOGLE_SEARCH_API_KEY", "GOOGLE_CX");

    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_provider(TextProvider::Search)
        .image_provider(ImageProvider::None)
        .snippet_limit(3)
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Artificial Intelligence", &config)
        .await
        .expect("live generation should succeed");

    assert!(!out.document.lines.is_empty());
    if out.stats.text_degraded.is_none() {
        // The digest renders as bulleted snippets, at most the snippet limit.
        assert!(out.document.lines.len() <= 3);
        assert!(out
            .document
            .lines
            .iter()
            .all(|l| l.kind == LineKind::Bullet));
    }
    assert_pdf_quality(&out.bytes, "live-search");
}

#[tokio::test]
async fn test_live_unsplash_backdrop() {
    e2e_skip_unless_ready!("UNSPLASH_ACCESS_KEY");

    let dir = tempdir().expect("tempdir");
    let config = GenerationConfig::builder()
        .text_source(Arc::new(StubText::new(SAMPLE_ARTICLE)))
        .image_provider(ImageProvider::Unsplash)
        .output_dir(dir.path())
        .build()
        .expect("valid config");

    let out = generate("Mountains", &config)
        .await
        .expect("live generation should succeed");

    assert!(
        out.stats.image_degraded.is_none(),
        "live image fetch degraded: {:?}",
        out.stats.image_degraded
    );
    assert!(out.document.background.is_some());
    assert!(contains(&out.bytes, b"/Image"));
    assert_pdf_quality(&out.bytes, "live-unsplash");
}
