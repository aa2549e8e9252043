//! crates/tube_quiz_core/src/error.rs
//!
//! Error types for one quiz generation run.

/// Failures of the Package Assembler.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The template archive is missing, unreadable, lacks the content descriptor,
    /// or has no donor question.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// A draft cannot become a question with exactly one correct answer.
    #[error("Invalid question draft: {0}")]
    InvalidDraft(String),

    /// Reading entries for the copy, or writing the output archive, failed.
    #[error("Packaging failed: {0}")]
    PackagingFailed(String),
}

/// The error taxonomy of a full run. Every variant aborts the remaining stages.
#[derive(Debug, thiserror::Error)]
pub enum QuizError {
    /// Text acquisition produced nothing usable. `raw` holds whatever the
    /// upstream source returned, when it returned anything at all.
    #[error("Content unavailable: {message}")]
    ContentUnavailable {
        message: String,
        raw: Option<String>,
    },

    #[error("Question generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Packaging failed: {0}")]
    PackagingFailed(String),
}

impl From<PackageError> for QuizError {
    fn from(err: PackageError) -> Self {
        match err {
            PackageError::InvalidTemplate(msg) => QuizError::InvalidTemplate(msg),
            PackageError::InvalidDraft(msg) => QuizError::GenerationUnavailable(msg),
            PackageError::PackagingFailed(msg) => QuizError::PackagingFailed(msg),
        }
    }
}
