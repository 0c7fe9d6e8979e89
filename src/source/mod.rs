//! Content sources: the text and imagery a document is built from.
//!
//! Every document starts with two fetches — an article-shaped text for the
//! body and an optional photo for the backdrop. Each source speaks to one
//! external API and nothing else; selection policy (which source runs for a
//! given config) lives in [`crate::generate`], and degradation policy (what
//! happens when a fetch fails) lives there too. A source's only job is to
//! either produce content or report a precise [`SourceError`].
//!
//! The traits are object-safe so tests and embedders can inject fakes
//! through [`crate::config::GenerationConfig`] without touching HTTP.

use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;

use crate::error::SourceError;

pub mod gemini;
pub mod unsplash;
pub mod websearch;

pub use gemini::GeminiSource;
pub use unsplash::UnsplashSource;
pub use websearch::SearchSource;

/// Supplies the body text for a topic.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Fetch article-shaped text for the topic. Light markup (bold wrappers,
    /// bullets, ATX headings) is expected and handled downstream.
    async fn fetch_text(&self, topic: &str) -> Result<String, SourceError>;

    /// Short provider name, used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Sentinel the document falls back to when this source fails.
    fn placeholder(&self) -> &'static str {
        "No content generated."
    }
}

// The provider name is the only identity a source has; these impls let
// `Arc<dyn …Source>` values sit inside types that derive or require `Debug`.
impl fmt::Debug for dyn TextSource + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextSource")
            .field("name", &self.name())
            .finish()
    }
}

/// Supplies the optional backdrop image for a topic.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch raw encoded image bytes (PNG or JPEG) for the topic.
    async fn fetch_image(&self, topic: &str) -> Result<Vec<u8>, SourceError>;

    /// Short provider name, used in logs and error messages.
    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn ImageSource + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("name", &self.name())
            .finish()
    }
}

// ── Shared HTTP plumbing ─────────────────────────────────────────────────

/// Build the per-source HTTP client with the configured timeout.
pub(crate) fn http_client(timeout_secs: u64) -> Result<Client, SourceError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SourceError::Network {
            provider: "http".to_string(),
            detail: e.to_string(),
        })
}

/// Map a transport error onto the source taxonomy.
pub(crate) fn transport_error(
    err: reqwest::Error,
    provider: &str,
    timeout_secs: u64,
) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout {
            provider: provider.to_string(),
            secs: timeout_secs,
        }
    } else if err.is_decode() {
        SourceError::Decode {
            provider: provider.to_string(),
            detail: err.to_string(),
        }
    } else {
        SourceError::Network {
            provider: provider.to_string(),
            detail: err.to_string(),
        }
    }
}

/// Turn a non-success response into a [`SourceError::Status`], keeping a
/// short prefix of the body for diagnostics.
pub(crate) async fn status_error(response: reqwest::Response, provider: &str) -> SourceError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SourceError::Status {
        provider: provider.to_string(),
        status,
        detail: brief(&body),
    }
}

/// Download raw bytes from a URL a search API handed back.
pub(crate) async fn download_bytes(
    client: &Client,
    url: &str,
    provider: &str,
    timeout_secs: u64,
) -> Result<Vec<u8>, SourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| transport_error(e, provider, timeout_secs))?;
    if !response.status().is_success() {
        return Err(status_error(response, provider).await);
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(e, provider, timeout_secs))?;
    Ok(bytes.to_vec())
}

/// First 200 chars of an error body; API errors repeat themselves at length.
fn brief(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= 200 {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(200).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brief_passes_short_bodies_through() {
        assert_eq!(brief("  quota exceeded  "), "quota exceeded");
    }

    #[test]
    fn test_brief_truncates_long_bodies() {
        let long = "x".repeat(500);
        let out = brief(&long);
        assert_eq!(out.chars().count(), 203);
        assert!(out.ends_with("..."));
    }
}
