//! crates/tube_quiz_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like captions APIs or LLMs.

use crate::domain::{QuestionDraft, QuizLanguage, VideoReference};
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., network, model APIs).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Content unavailable: {0}")]
    ContentUnavailable(String),
    #[error("Question generation unavailable: {0}")]
    GenerationUnavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    /// The message without the variant prefix.
    pub fn into_message(self) -> String {
        match self {
            PortError::ContentUnavailable(msg)
            | PortError::GenerationUnavailable(msg)
            | PortError::Unexpected(msg) => msg,
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Produces the text a quiz is generated from: a transcript, or a
    /// model-written description of the video.
    async fn fetch_content(&self, video: &VideoReference) -> PortResult<String>;
}

#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generates up to `count` multiple-choice drafts about `text`, written in `language`.
    ///
    /// An empty result is not an error at this boundary; callers decide.
    async fn generate_questions(
        &self,
        text: &str,
        count: u32,
        language: QuizLanguage,
    ) -> PortResult<Vec<QuestionDraft>>;
}
