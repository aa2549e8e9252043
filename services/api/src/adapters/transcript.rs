//! services/api/src/adapters/transcript.rs
//!
//! This module contains the adapter for YouTube captions.
//! It implements the `ContentSource` port from the `core` crate.

use async_trait::async_trait;
use tracing::info;
use tube_quiz_core::{
    domain::VideoReference,
    ports::{ContentSource, PortError, PortResult},
};
use yt_transcript_rs::api::YouTubeTranscriptApi;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentSource` by downloading the video's captions.
pub struct YouTubeTranscriptAdapter {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
}

impl YouTubeTranscriptAdapter {
    /// Creates a new `YouTubeTranscriptAdapter`. `languages` is the caption
    /// preference order, as language codes.
    pub fn new(api: YouTubeTranscriptApi, languages: Vec<String>) -> Self {
        Self { api, languages }
    }
}

/// Joins caption snippets into one line of text, collapsing the line breaks
/// captions carry for display.
fn join_snippets<'a>(snippets: impl IntoIterator<Item = &'a str>) -> String {
    snippets
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

//=========================================================================================
// `ContentSource` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentSource for YouTubeTranscriptAdapter {
    async fn fetch_content(&self, video: &VideoReference) -> PortResult<String> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let transcript = self
            .api
            .fetch_transcript(video.video_id(), &languages, false)
            .await
            .map_err(|e| {
                PortError::ContentUnavailable(format!(
                    "Could not fetch captions for video {}: {}",
                    video.video_id(),
                    e
                ))
            })?;

        info!(
            "Fetched {} caption snippets for video {} in {}.",
            transcript.snippets.len(),
            video.video_id(),
            transcript.language_code
        );
        Ok(join_snippets(
            transcript.snippets.iter().map(|snippet| snippet.text.as_str()),
        ))
    }
}
