//! Prompt templates for the generative text source.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the wording is load-bearing: the line
//!    classifier assumes the model was asked for bold headings and bulleted
//!    structure, so a change here changes what
//!    [`crate::pipeline::normalize`] sees. Editing exactly one place keeps
//!    that coupling visible.
//!
//! 2. **Testability** — unit tests can pin the wording directly without
//!    calling a real API, making prompt regressions easy to catch.

/// Prompt sent to the generative API for one topic.
///
/// Asks for lightweight Markdown on purpose: headings and bold wrappers are
/// exactly the markers the classifier understands. Richer syntax (tables,
/// links, nested lists) would survive into the PDF as literal text, so it
/// is not requested.
pub fn article_prompt(topic: &str) -> String {
    format!(
        "Write a structured article on \"{topic}\" in Markdown format using proper headings and bold formatting."
    )
}
