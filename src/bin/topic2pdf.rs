//! CLI binary for topic2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `GenerationConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use topic2pdf::{
    generate_many, GenerationConfig, GenerationProgressCallback, ImageProvider, ProgressCallback,
    SourceError, TextProvider,
};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: renders a live progress bar and per-topic log
/// lines using [indicatif]. Designed to work correctly when topics complete
/// out-of-order (the batch runs concurrently).
struct CliProgressCallback {
    /// The single progress bar anchored at the bottom of the terminal.
    bar: ProgressBar,
    /// Per-topic wall-clock start times for elapsed reporting.
    start_times: Mutex<HashMap<String, Instant>>,
    /// Count of degraded source fetches across the whole batch.
    degraded: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose progress-bar length is set dynamically
    /// by `on_batch_start` (called before any topics are processed).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        // Initial style: spinner only (no counter until we know the total).
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Resolving providers…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            degraded: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} topics  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Generating");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, topic: &str) -> f64 {
        self.start_times
            .lock()
            .unwrap()
            .remove(topic)
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0) as f64
            / 1000.0
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_topics: usize) {
        // Switch from spinner-only style to full progress bar now that we
        // know how many topics will run.
        self.activate_bar(total_topics);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting generation of {total_topics} topics…"))
        ));
    }

    fn on_topic_start(&self, topic: &str) {
        self.start_times
            .lock()
            .unwrap()
            .insert(topic.to_string(), Instant::now());
        self.bar.set_message(topic.to_string());
    }

    fn on_source_degraded(&self, topic: &str, error: &SourceError) {
        self.degraded.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {}  {}",
            cyan("⚠"),
            topic,
            dim(&truncate(&error.to_string(), 80)),
        ));
    }

    fn on_topic_complete(&self, topic: &str, pages: usize) {
        let elapsed = self.elapsed_secs(topic);
        self.bar.println(format!(
            "  {} {:<40}  {:<8}  {}",
            green("✓"),
            topic,
            dim(&format!("{pages} pages")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_topic_error(&self, topic: &str, error: &str) {
        let elapsed = self.elapsed_secs(topic);
        self.bar.println(format!(
            "  {} {:<40}  {}  {}",
            red("✗"),
            topic,
            red(&truncate(error, 80)),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_topics: usize, success_count: usize) {
        let failed = total_topics.saturating_sub(success_count);
        let degraded = self.degraded.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} topics generated successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} topics generated  ({} failed)",
                if failed == total_topics {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_topics,
                red(&failed.to_string()),
            );
        }
        if degraded > 0 {
            eprintln!(
                "  {} source fetches degraded (placeholder text or missing backdrop)",
                cyan(&degraded.to_string())
            );
        }
    }
}

/// Truncate very long messages to keep terminal output tidy.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    } else {
        s.to_string()
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One topic, providers auto-detected from the environment
  topic2pdf "Artificial Intelligence"

  # Several topics, generated concurrently
  topic2pdf "Rust" "Quantum Computing" "Coral Reefs"

  # Search digest instead of a generated article
  topic2pdf --text-provider search "Mars Missions"

  # Skip the backdrop photo entirely
  topic2pdf --image-provider none "Type Systems"

  # Custom output directory and model
  topic2pdf -o briefs --model gemini-1.5-pro "History of Tea"

  # JSON summary for scripting
  topic2pdf --json "Rust" "Go" > summary.json

PROVIDERS:
  Kind    Provider     Needs
  ─────   ──────────   ──────────────────────────────────────
  text    generative   GOOGLE_API_KEY            (Gemini article, preferred)
  text    search       GOOGLE_SEARCH_API_KEY + GOOGLE_CX  (snippet digest)
  image   unsplash     UNSPLASH_ACCESS_KEY       (landscape photo, preferred)
  image   search       GOOGLE_SEARCH_API_KEY + GOOGLE_CX  (first image hit)

  A failed or unconfigured image source never fails a topic — the PDF just
  renders without its backdrop. A missing text provider is a configuration
  error; a *failing* text provider degrades to placeholder text.

ENVIRONMENT VARIABLES:
  GOOGLE_API_KEY           Gemini generative API key
  GOOGLE_SEARCH_API_KEY    Google Custom Search API key
  GOOGLE_CX                Custom Search engine identifier
  UNSPLASH_ACCESS_KEY      Unsplash access key
  RUST_LOG                 Tracing filter (overrides -v / -q)

SETUP:
  1. Set an API key:   export GOOGLE_API_KEY=...
  2. Generate:         topic2pdf "Artificial Intelligence"
                       → writes pdfs/Artificial_Intelligence.pdf
"#;

/// Generate styled PDF briefs about any topic.
#[derive(Parser, Debug)]
#[command(
    name = "topic2pdf",
    version,
    about = "Generate styled PDF briefs about any topic",
    long_about = "Generate styled, paginated PDF documents about any topic using live content \
APIs. Text comes from the Gemini generative endpoint or a Google Custom Search snippet digest; \
an optional backdrop photo comes from Unsplash or Custom Search image mode.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Topics to generate, one PDF each.
    #[arg(default_value = "Artificial Intelligence")]
    topics: Vec<String>,

    /// Directory the PDF files are written into.
    #[arg(short, long, env = "TOPIC2PDF_OUTPUT_DIR", default_value = "pdfs")]
    output_dir: PathBuf,

    /// Text provider: auto, generative, search.
    #[arg(
        long,
        env = "TOPIC2PDF_TEXT_PROVIDER",
        value_enum,
        default_value = "auto",
        long_help = "Which backend supplies the topic text. 'auto' prefers the generative \
          endpoint when GOOGLE_API_KEY is set and falls back to the search digest; an explicit \
          choice without its credentials is an error."
    )]
    text_provider: TextProviderArg,

    /// Image provider: auto, unsplash, search, none.
    #[arg(
        long,
        env = "TOPIC2PDF_IMAGE_PROVIDER",
        value_enum,
        default_value = "auto",
        long_help = "Which backend supplies the backdrop photo. 'auto' prefers Unsplash, then \
          Custom Search images, then no backdrop at all. 'none' skips the image fetch entirely."
    )]
    image_provider: ImageProviderArg,

    /// Generative model ID (e.g. gemini-pro, gemini-1.5-pro).
    #[arg(long, env = "TOPIC2PDF_MODEL", default_value = "gemini-pro")]
    model: String,

    /// Gemini generative API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    google_api_key: Option<String>,

    /// Google Custom Search API key.
    #[arg(long, env = "GOOGLE_SEARCH_API_KEY", hide_env_values = true)]
    google_search_api_key: Option<String>,

    /// Custom Search engine identifier (cx).
    #[arg(long, env = "GOOGLE_CX", hide_env_values = true)]
    google_cx: Option<String>,

    /// Unsplash access key.
    #[arg(long, env = "UNSPLASH_ACCESS_KEY", hide_env_values = true)]
    unsplash_access_key: Option<String>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "TOPIC2PDF_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Search snippets folded into the text digest (1-10).
    #[arg(long, env = "TOPIC2PDF_SNIPPETS", default_value_t = 5)]
    snippets: usize,

    /// Number of topics generated concurrently.
    #[arg(short, long, env = "TOPIC2PDF_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Print a JSON summary of all results to stdout.
    #[arg(long, env = "TOPIC2PDF_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "TOPIC2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TOPIC2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TOPIC2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum TextProviderArg {
    Auto,
    Generative,
    Search,
}

impl From<TextProviderArg> for TextProvider {
    fn from(v: TextProviderArg) -> Self {
        match v {
            TextProviderArg::Auto => TextProvider::Auto,
            TextProviderArg::Generative => TextProvider::Generative,
            TextProviderArg::Search => TextProvider::Search,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ImageProviderArg {
    Auto,
    Unsplash,
    Search,
    None,
}

impl From<ImageProviderArg> for ImageProvider {
    fn from(v: ImageProviderArg) -> Self {
        match v {
            ImageProviderArg::Auto => ImageProvider::Auto,
            ImageProviderArg::Unsplash => ImageProvider::Unsplash,
            ImageProviderArg::Search => ImageProvider::Search,
            ImageProviderArg::None => ImageProvider::None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    // In verbose mode we always want all logs regardless of progress.
    let filter = if cli.verbose { "debug" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    // The progress bar starts as a spinner (topic count not applied yet);
    // `on_batch_start` resizes it to the batch total.
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run generation ───────────────────────────────────────────────────
    let results = generate_many(&cli.topics, &config).await;

    if cli.json {
        let summaries: Vec<TopicSummary> = results
            .iter()
            .map(|item| match &item.result {
                Ok(output) => TopicSummary {
                    topic: &item.topic,
                    output: Some(output),
                    error: None,
                },
                Err(e) => TopicSummary {
                    topic: &item.topic,
                    output: None,
                    error: Some(e.to_string()),
                },
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).context("Failed to serialise summary")?
        );
        let failed = results.iter().filter(|r| r.result.is_err()).count();
        if failed > 0 {
            anyhow::bail!("{}/{} topics failed", failed, results.len());
        }
        return Ok(());
    }

    // Summary lines (the callback already printed the live per-topic log).
    let mut failed = 0usize;
    for item in &results {
        match &item.result {
            Ok(output) => {
                if !cli.quiet {
                    let mut notes: Vec<&str> = Vec::new();
                    if output.stats.text_degraded.is_some() {
                        notes.push("placeholder text");
                    }
                    if output.stats.image_degraded.is_some() {
                        notes.push("no backdrop");
                    }
                    let note = if notes.is_empty() {
                        String::new()
                    } else {
                        format!("  {}", dim(&format!("({})", notes.join(", "))))
                    };
                    eprintln!(
                        "{}  {}  {}  →  {}{}",
                        green("✔"),
                        bold(&item.topic),
                        dim(&format!(
                            "{} pages, {} lines, {}ms",
                            output.stats.pages, output.stats.lines, output.stats.total_duration_ms
                        )),
                        bold(&output.path.display().to_string()),
                        note,
                    );
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}  {}  {}", red("✘"), bold(&item.topic), red(&e.to_string()));
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{}/{} topics failed", failed, results.len());
    }
    Ok(())
}

/// One row of the `--json` summary.
#[derive(serde::Serialize)]
struct TopicSummary<'a> {
    topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a topic2pdf::GenerationOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .text_provider(cli.text_provider.clone().into())
        .image_provider(cli.image_provider.clone().into())
        .model(cli.model.clone())
        .output_dir(cli.output_dir.clone())
        .request_timeout_secs(cli.timeout)
        .snippet_limit(cli.snippets)
        .concurrency(cli.concurrency);

    if let Some(ref key) = cli.google_api_key {
        builder = builder.google_api_key(key);
    }
    if let Some(ref key) = cli.google_search_api_key {
        builder = builder.google_search_api_key(key);
    }
    if let Some(ref cx) = cli.google_cx {
        builder = builder.google_cx(cx);
    }
    if let Some(ref key) = cli.unsplash_access_key {
        builder = builder.unsplash_access_key(key);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
