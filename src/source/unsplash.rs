//! Backdrop photos from the Unsplash search API.
//!
//! One landscape photo per topic, fetched at the `regular` rendition —
//! large enough to stretch across an A4 page without looking smeared,
//! small enough to keep the request quick. Auth is the `Client-ID`
//! authorization scheme Unsplash uses for public API access.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use crate::error::SourceError;
use crate::source::{download_bytes, http_client, status_error, transport_error, ImageSource};

const PROVIDER: &str = "unsplash";
const ENDPOINT: &str = "https://api.unsplash.com/search/photos";

/// Image source backed by Unsplash photo search.
pub struct UnsplashSource {
    client: Client,
    access_key: String,
    timeout_secs: u64,
}

impl UnsplashSource {
    pub fn new(access_key: impl Into<String>, timeout_secs: u64) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            access_key: access_key.into(),
            timeout_secs,
        })
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct PhotoSearchReply {
    results: Option<Vec<Photo>>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    urls: Option<PhotoUrls>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: Option<String>,
}

fn first_photo_url(reply: PhotoSearchReply) -> Option<String> {
    reply
        .results?
        .into_iter()
        .find_map(|photo| photo.urls.and_then(|urls| urls.regular))
}

#[async_trait]
impl ImageSource for UnsplashSource {
    async fn fetch_image(&self, topic: &str) -> Result<Vec<u8>, SourceError> {
        debug!(topic, "searching unsplash");
        let response = self
            .client
            .get(ENDPOINT)
            .header(
                header::AUTHORIZATION,
                format!("Client-ID {}", self.access_key),
            )
            .query(&[
                ("query", topic),
                ("orientation", "landscape"),
                ("per_page", "1"),
            ])
            .send()
            .await
            .map_err(|e| transport_error(e, PROVIDER, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(status_error(response, PROVIDER).await);
        }

        let reply: PhotoSearchReply = response
            .json()
            .await
            .map_err(|e| transport_error(e, PROVIDER, self.timeout_secs))?;

        let url = first_photo_url(reply).ok_or_else(|| SourceError::EmptyReply {
            provider: PROVIDER.to_string(),
            topic: topic.to_string(),
        })?;
        download_bytes(&self.client, &url, PROVIDER, self.timeout_secs).await
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
