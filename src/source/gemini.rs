//! Generated article text from the Gemini `generateContent` API.
//!
//! The request is a single user prompt (built by [`crate::prompts`]) and
//! the reply is mined for the first candidate's first text part. Everything
//! in the reply shape is optional because the API omits fields freely:
//! safety-blocked prompts come back with no candidates at all, and a
//! candidate can carry content with no text parts.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SourceError;
use crate::prompts::article_prompt;
use crate::source::{http_client, status_error, transport_error, TextSource};

const PROVIDER: &str = "gemini";
const ENDPOINT_BASE: &str = "https://generativelanguage.googleapis.com/v1/models";

/// Text source backed by the Gemini generative API.
pub struct GeminiSource {
    client: Client,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiSource {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, SourceError> {
        Ok(Self {
            client: http_client(timeout_secs)?,
            api_key: api_key.into(),
            model: model.into(),
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{ENDPOINT_BASE}/{}:generateContent", self.model)
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    candidates: Option<Vec<ReplyCandidate>>,
}

#[derive(Debug, Deserialize)]
struct ReplyCandidate {
    content: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    parts: Option<Vec<ReplyPart>>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

/// First non-blank text in the first candidate, if any.
fn first_text(reply: GenerateReply) -> Option<String> {
    reply
        .candidates?
        .into_iter()
        .next()?
        .content?
        .parts?
        .into_iter()
        .find_map(|part| part.text.filter(|text| !text.trim().is_empty()))
}

#[async_trait]
impl TextSource for GeminiSource {
    async fn fetch_text(&self, topic: &str) -> Result<String, SourceError> {
        let prompt = article_prompt(topic);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };

        debug!(topic, model = %self.model, "requesting generated article");
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, PROVIDER, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(status_error(response, PROVIDER).await);
        }

        let reply: GenerateReply = response
            .json()
            .await
            .map_err(|e| transport_error(e, PROVIDER, self.timeout_secs))?;

        first_text(reply).ok_or_else(|| SourceError::EmptyReply {
            provider: PROVIDER.to_string(),
            topic: topic.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
