//! Progress-callback trait for per-topic generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! real-time events as each topic moves through fetch, layout, and write.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio broadcast channel, a WebSocket, a database record,
//! or a terminal progress bar — without the library knowing anything about how
//! the host application communicates. The trait is `Send + Sync` so it works
//! correctly when topics are generated concurrently.
//!
//! # Example
//!
//! ```rust
//! use topic2pdf::{GenerationProgressCallback, GenerationConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl GenerationProgressCallback for CountingCallback {
//!     fn on_topic_complete(&self, topic: &str, pages: usize) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{done}: {topic} done ({pages} pages)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(counter as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

use crate::error::SourceError;

/// Called by the generation pipeline as it processes each topic.
///
/// Implementations must be `Send + Sync` (batch generation runs topics
/// concurrently). All methods have default no-op implementations so callers
/// only override what they care about.
///
/// # Thread safety
///
/// During batch generation, per-topic methods may be called concurrently
/// from different tasks. Implementations must protect shared mutable state
/// with appropriate synchronisation primitives (e.g. `Mutex`, `AtomicUsize`).
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once before any topic in a batch is started.
    fn on_batch_start(&self, total_topics: usize) {
        let _ = total_topics;
    }

    /// Called just before a topic's content fetches begin.
    fn on_topic_start(&self, topic: &str) {
        let _ = topic;
    }

    /// Called when a content fetch failed and the document degraded to a
    /// placeholder (text) or to no backdrop (image). Generation continues.
    fn on_source_degraded(&self, topic: &str, error: &SourceError) {
        let _ = (topic, error);
    }

    /// Called when a topic's PDF has been produced.
    fn on_topic_complete(&self, topic: &str, pages: usize) {
        let _ = (topic, pages);
    }

    /// Called when a topic failed fatally (no PDF for this topic).
    fn on_topic_error(&self, topic: &str, error: &str) {
        let _ = (topic, error);
    }

    /// Called once after every topic in a batch has been attempted.
    fn on_batch_complete(&self, total_topics: usize, success_count: usize) {
        let _ = (total_topics, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
