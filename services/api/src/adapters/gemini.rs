//! services/api/src/adapters/gemini.rs
//!
//! This module contains the adapter that has a Gemini model watch the video and
//! describe it. It implements the `ContentSource` port from the `core` crate.
//!
//! The model sometimes answers with a short refusal instead of a description; the
//! pipeline's minimum-length check is what catches that, not this adapter.

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const DESCRIBE_PROMPT: &str = "Describe the content of this video in detail, as a continuous text. \
Cover every topic, explanation, fact, example and conclusion that is presented, in the order they appear. \
Do not add an introduction or commentary of your own.";

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tube_quiz_core::{
    domain::VideoReference,
    ports::{ContentSource, PortError, PortResult},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentSource` using Gemini's video understanding.
#[derive(Clone)]
pub struct GeminiVideoAdapter {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiVideoAdapter {
    /// Creates a new `GeminiVideoAdapter`.
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Points the adapter at another endpoint, e.g. a proxy.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

//=========================================================================================
// `ContentSource` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentSource for GeminiVideoAdapter {
    async fn fetch_content(&self, video: &VideoReference) -> PortResult<String> {
        let body = json!({
            "contents": [{
                "parts": [
                    {"file_data": {"file_uri": video.watch_url()}},
                    {"text": DESCRIBE_PROMPT}
                ]
            }]
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::ContentUnavailable(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PortError::ContentUnavailable(format!(
                "Gemini answered {} for video {}: {}",
                status,
                video.video_id(),
                detail.trim()
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            PortError::ContentUnavailable(format!("Gemini response could not be read: {}", e))
        })?;
        let text = extract_text(parsed).ok_or_else(|| {
            PortError::ContentUnavailable(format!(
                "Gemini returned no description for video {}",
                video.video_id()
            ))
        })?;

        info!(
            "Gemini described video {} in {} characters.",
            video.video_id(),
            text.chars().count()
        );
        Ok(text)
    }
}
