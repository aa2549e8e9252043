//! crates/tube_quiz_core/src/pipeline.rs
//!
//! Runs the content stages of a quiz generation: content fetch, then question
//! generation, strictly in sequence. Any failure aborts the remaining stages.

use crate::domain::{QuestionDraft, QuizLanguage, QuizRequest, VideoReference};
use crate::error::QuizError;
use crate::ports::{ContentSource, QuestionGenerator};
use std::sync::Arc;
use tracing::{info, warn};

/// Fetched text shorter than this many characters is treated as a silent failure.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 500;

/// The outcome of the content stages, ready for package assembly.
#[derive(Debug, Clone)]
pub struct PreparedQuiz {
    pub content_chars: usize,
    pub drafts: Vec<QuestionDraft>,
}

pub struct QuizPipeline {
    content: Arc<dyn ContentSource>,
    generator: Arc<dyn QuestionGenerator>,
    min_content_chars: usize,
}

impl QuizPipeline {
    pub fn new(content: Arc<dyn ContentSource>, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            content,
            generator,
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
        }
    }

    pub fn with_min_content_chars(mut self, min_content_chars: usize) -> Self {
        self.min_content_chars = min_content_chars;
        self
    }

    pub fn min_content_chars(&self) -> usize {
        self.min_content_chars
    }

    /// Fetches the text for `video`.
    ///
    /// Upstream models sometimes return an apology or error message as if it were
    /// content, so anything shorter than the configured minimum is rejected along
    /// with the text itself.
    pub async fn fetch_content(&self, video: &VideoReference) -> Result<String, QuizError> {
        let text = self
            .content
            .fetch_content(video)
            .await
            .map_err(|e| QuizError::ContentUnavailable {
                message: e.into_message(),
                raw: None,
            })?;

        let chars = text.chars().count();
        if chars < self.min_content_chars {
            warn!(
                "Content for video {} is only {} characters long (minimum {}).",
                video, chars, self.min_content_chars
            );
            return Err(QuizError::ContentUnavailable {
                message: format!(
                    "video {video} produced only {chars} characters of text (minimum {}); upstream returned: {}",
                    self.min_content_chars,
                    text.trim()
                ),
                raw: Some(text),
            });
        }
        info!("Content for video {} ready ({} characters).", video, chars);
        Ok(text)
    }

    /// Asks the generator for drafts. Any non-zero number of drafts is accepted.
    pub async fn generate_drafts(
        &self,
        text: &str,
        count: u32,
        language: QuizLanguage,
    ) -> Result<Vec<QuestionDraft>, QuizError> {
        let drafts = self
            .generator
            .generate_questions(text, count, language)
            .await
            .map_err(|e| QuizError::GenerationUnavailable(e.into_message()))?;

        if drafts.is_empty() {
            return Err(QuizError::GenerationUnavailable(
                "the model returned no questions".to_string(),
            ));
        }
        for draft in &drafts {
            draft
                .validate()
                .map_err(|msg| QuizError::GenerationUnavailable(format!("malformed question: {msg}")))?;
        }
        if drafts.len() != count as usize {
            warn!(
                "Requested {} questions but the model returned {}; keeping all of them.",
                count,
                drafts.len()
            );
        }
        info!("Received {} question drafts in {}.", drafts.len(), language);
        Ok(drafts)
    }

    /// Runs both content stages for `request`.
    pub async fn prepare(&self, request: &QuizRequest) -> Result<PreparedQuiz, QuizError> {
        let text = self.fetch_content(&request.video).await?;
        let drafts = self
            .generate_drafts(&text, request.question_count, request.language)
            .await?;
        Ok(PreparedQuiz {
            content_chars: text.chars().count(),
            drafts,
        })
    }
}
