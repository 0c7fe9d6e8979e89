//! Streaming batch API: emit topic results as they complete.
//!
//! ## Why stream?
//!
//! A batch of topics takes as long as its slowest fetch. A streams-based API
//! lets callers report each finished PDF immediately, feed progress displays,
//! or start downstream work per topic instead of waiting for the whole batch.
//!
//! Unlike the eager [`crate::generate::generate_many`] which returns only
//! after every topic finishes, [`generate_stream`] yields a [`TopicResult`]
//! as each topic completes. Results arrive in completion order, not input
//! order (match on `TopicResult::topic` if order matters).

use crate::config::GenerationConfig;
use crate::generate::{generate_to_file, TopicResult};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-topic results.
pub type TopicStream = Pin<Box<dyn Stream<Item = TopicResult> + Send>>;

/// Generate PDFs for several topics, streaming each result as it is ready.
///
/// At most `config.concurrency` topics are in flight at once; each is an
/// independent request writing its own file, so one failing leaves the rest
/// untouched. Per-topic progress events fire as usual, but batch-level events
/// (`on_batch_start` / `on_batch_complete`) do not — the caller sees every
/// completion directly.
///
/// # Example
/// ```rust,no_run
/// use topic2pdf::{generate_stream, GenerationConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() {
/// let topics = vec!["Rust".to_string(), "Coral Reefs".to_string()];
/// let mut stream = generate_stream(topics, GenerationConfig::default());
/// while let Some(item) = stream.next().await {
///     match item.result {
///         Ok(out) => println!("{} → {}", item.topic, out.path.display()),
///         Err(e) => eprintln!("{}: {}", item.topic, e),
///     }
/// }
/// # }
/// ```
pub fn generate_stream(topics: Vec<String>, config: GenerationConfig) -> TopicStream {
    info!("Starting streaming generation of {} topics", topics.len());
    let concurrency = config.concurrency.max(1);

    let s = stream::iter(topics.into_iter().map(move |topic| {
        let config = config.clone();
        async move {
            let result = generate_to_file(&topic, &config).await;
            TopicResult { topic, result }
        }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}
