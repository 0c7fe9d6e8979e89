//! Google Custom Search: snippet digests for text, first hit for imagery.
//!
//! One engine serves two roles. As a [`TextSource`] it folds the top search
//! snippets into a bulleted digest — not prose, but a faithful summary when
//! no generative key is configured. As an [`ImageSource`] it re-runs the
//! query in image mode and downloads the first hit.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::source::{
    download_bytes, http_client, status_error, transport_error, ImageSource, TextSource,
};

const PROVIDER: &str = "search";
const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Custom Search backed source for digests and images.
pub struct SearchSource {
    client: Client,
    api_key: String,
    engine_id: String,
    snippet_limit: usize,
    timeout_secs: u64,
}

impl SearchSource {
    pub fn new(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        snippet_limit: usize,
        timeout_secs: u64,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            snippet_limit,
            timeout_secs,
        })
    }

    async fn query(&self, topic: &str, image_mode: bool) -> Result<Vec<SearchItem>, SourceError> {
        // Number parameters must outlive the borrow in `params`.
        let num = if image_mode {
            "1".to_string()
        } else {
            self.snippet_limit.to_string()
        };
        let mut params = vec![
            ("key", self.api_key.as_str()),
            ("cx", self.engine_id.as_str()),
            ("q", topic),
            ("num", num.as_str()),
        ];
        if image_mode {
            params.push(("searchType", "image"));
        }

        debug!(topic, image_mode, "querying custom search");
        let response = self
            .client
            .get(ENDPOINT)
            .query(&params)
            .send()
            .await
            .map_err(|e| transport_error(e, PROVIDER, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(status_error(response, PROVIDER).await);
        }

        let reply: SearchReply = response
            .json()
            .await
            .map_err(|e| transport_error(e, PROVIDER, self.timeout_secs))?;
        Ok(reply.items.unwrap_or_default())
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchReply {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: Option<String>,
    snippet: Option<String>,
}

/// Fold snippets into a bulleted digest, one blank line between entries.
fn digest(items: &[SearchItem], limit: usize) -> Option<String> {
    let bullets: Vec<String> = items
        .iter()
        .filter_map(|item| item.snippet.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(limit)
        .map(|s| format!("• {s}"))
        .collect();
    if bullets.is_empty() {
        None
    } else {
        Some(bullets.join("\n\n"))
    }
}

fn first_link(items: Vec<SearchItem>) -> Option<String> {
    items.into_iter().find_map(|item| item.link)
}

#[async_trait]
impl TextSource for SearchSource {
    async fn fetch_text(&self, topic: &str) -> Result<String, SourceError> {
        let items = self.query(topic, false).await?;
        digest(&items, self.snippet_limit).ok_or_else(|| SourceError::EmptyReply {
            provider: PROVIDER.to_string(),
            topic: topic.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn placeholder(&self) -> &'static str {
        "No relevant information found."
    }
}

#[async_trait]
impl ImageSource for SearchSource {
    async fn fetch_image(&self, topic: &str) -> Result<Vec<u8>, SourceError> {
        let items = self.query(topic, true).await?;
        let link = first_link(items).ok_or_else(|| SourceError::EmptyReply {
            provider: PROVIDER.to_string(),
            topic: topic.to_string(),
        })?;
        download_bytes(&self.client, &link, PROVIDER, self.timeout_secs).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
