//! crates/tube_quiz_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any transport, model provider or archive format.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

pub const MIN_QUESTION_COUNT: u32 = 1;
pub const MAX_QUESTION_COUNT: u32 = 30;
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

/// Rejections of caller input, raised before any pipeline stage runs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Not a recognised YouTube URL or video ID: '{0}'")]
    InvalidVideoReference(String),
    #[error("Question count must be between 1 and 30, got {0}")]
    QuestionCountOutOfRange(u32),
    #[error("Unsupported question language: '{0}'")]
    UnsupportedLanguage(String),
}

//=========================================================================================
// Video Reference
//=========================================================================================

static BARE_VIDEO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("static regex"));

static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.|music\.)?(?:youtube\.com/(?:watch\?(?:[^#]*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#/].*)?$",
    )
    .expect("static regex")
});

/// A resolved YouTube video, identified by its 11-character ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoReference {
    video_id: String,
}

impl VideoReference {
    /// Accepts a watch URL, a `youtu.be` short link, a shorts/embed/live URL,
    /// or a bare video ID.
    pub fn parse(input: &str) -> Result<Self, RequestError> {
        let trimmed = input.trim();
        if BARE_VIDEO_ID.is_match(trimmed) {
            return Ok(Self {
                video_id: trimmed.to_string(),
            });
        }
        VIDEO_URL
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .map(|id| Self {
                video_id: id.as_str().to_string(),
            })
            .ok_or_else(|| RequestError::InvalidVideoReference(trimmed.to_string()))
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// The canonical watch URL, as understood by every content source.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.video_id)
    }
}

//=========================================================================================
// Question Language
//=========================================================================================

/// The fixed set of languages questions can be generated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizLanguage {
    #[default]
    Dutch,
    English,
    French,
    German,
    Spanish,
    Italian,
}

impl QuizLanguage {
    pub const ALL: [QuizLanguage; 6] = [
        QuizLanguage::Dutch,
        QuizLanguage::English,
        QuizLanguage::French,
        QuizLanguage::German,
        QuizLanguage::Spanish,
        QuizLanguage::Italian,
    ];

    /// The English name, used verbatim in generation prompts.
    pub fn name(self) -> &'static str {
        match self {
            QuizLanguage::Dutch => "Dutch",
            QuizLanguage::English => "English",
            QuizLanguage::French => "French",
            QuizLanguage::German => "German",
            QuizLanguage::Spanish => "Spanish",
            QuizLanguage::Italian => "Italian",
        }
    }

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            QuizLanguage::Dutch => "nl",
            QuizLanguage::English => "en",
            QuizLanguage::French => "fr",
            QuizLanguage::German => "de",
            QuizLanguage::Spanish => "es",
            QuizLanguage::Italian => "it",
        }
    }
}

impl fmt::Display for QuizLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuizLanguage {
    type Err = RequestError;

    /// Accepts either the English name or the ISO code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|lang| {
                lang.name().eq_ignore_ascii_case(wanted) || lang.code().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| RequestError::UnsupportedLanguage(wanted.to_string()))
    }
}

//=========================================================================================
// Quiz Request
//=========================================================================================

/// A validated request for one quiz generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRequest {
    pub video: VideoReference,
    pub question_count: u32,
    pub language: QuizLanguage,
}

impl QuizRequest {
    pub fn new(
        video: VideoReference,
        question_count: u32,
        language: QuizLanguage,
    ) -> Result<Self, RequestError> {
        if !(MIN_QUESTION_COUNT..=MAX_QUESTION_COUNT).contains(&question_count) {
            return Err(RequestError::QuestionCountOutOfRange(question_count));
        }
        Ok(Self {
            video,
            question_count,
            language,
        })
    }
}

//=========================================================================================
// Question Draft
//=========================================================================================

/// A generated candidate question, not yet mapped into the package format.
///
/// Generators are asked for exactly four answers, but drafts with a different
/// number of answers are carried through as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question_text: String,
    pub answer_texts: Vec<String>,
    pub correct_index: usize,
}

impl QuestionDraft {
    pub fn new(
        question_text: impl Into<String>,
        answer_texts: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self {
            question_text: question_text.into(),
            answer_texts,
            correct_index,
        }
    }

    pub fn correct_answer(&self) -> Option<&str> {
        self.answer_texts.get(self.correct_index).map(String::as_str)
    }

    /// Checks that the draft can be mapped to a question with exactly one
    /// correct answer.
    pub fn validate(&self) -> Result<(), String> {
        if self.question_text.trim().is_empty() {
            return Err("question text is empty".to_string());
        }
        if self.answer_texts.is_empty() {
            return Err(format!("question '{}' has no answers", self.question_text));
        }
        if self.correct_index >= self.answer_texts.len() {
            return Err(format!(
                "question '{}' marks answer {} as correct but only has {} answers",
                self.question_text,
                self.correct_index,
                self.answer_texts.len()
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_video_reference_forms() {
        let inputs = [
            "dQw4w9WgXcQ",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=shared&v=dQw4w9WgXcQ&t=42",
            "youtube.com/watch?v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?feature=shared",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "  https://youtu.be/dQw4w9WgXcQ  ",
        ];
        for input in inputs {
            let video = VideoReference::parse(input).unwrap();
            assert_eq!(video.video_id(), "dQw4w9WgXcQ", "input: {input}");
        }
    }

    #[test]
    fn rejects_unrecognised_video_references() {
        let inputs = [
            "",
            "https://www.youtube.com/watch",
            "https://vimeo.com/123456789",
            "https://www.youtube.com/watch?v=short",
            "https://youtu.be/dQw4w9WgXcQextra",
        ];
        for input in inputs {
            assert!(VideoReference::parse(input).is_err(), "input: {input}");
        }
    }

    #[test]
    fn watch_url_is_canonical() {
        let video = VideoReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
        assert_eq!(video.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn language_parses_from_name_or_code() {
        assert_eq!("dutch".parse::<QuizLanguage>().unwrap(), QuizLanguage::Dutch);
        assert_eq!("DE".parse::<QuizLanguage>().unwrap(), QuizLanguage::German);
        assert_eq!(" Spanish ".parse::<QuizLanguage>().unwrap(), QuizLanguage::Spanish);
        assert!("klingon".parse::<QuizLanguage>().is_err());
    }

    #[test]
    fn request_bounds_question_count() {
        let video = VideoReference::parse("dQw4w9WgXcQ").unwrap();
        assert!(QuizRequest::new(video.clone(), 1, QuizLanguage::English).is_ok());
        assert!(QuizRequest::new(video.clone(), 30, QuizLanguage::English).is_ok());
        assert_eq!(
            QuizRequest::new(video.clone(), 0, QuizLanguage::English),
            Err(RequestError::QuestionCountOutOfRange(0))
        );
        assert_eq!(
            QuizRequest::new(video, 31, QuizLanguage::English),
            Err(RequestError::QuestionCountOutOfRange(31))
        );
    }

    #[test]
    fn draft_validation_requires_a_reachable_correct_answer() {
        let ok = QuestionDraft::new("Q?", vec!["a".into(), "b".into()], 1);
        assert!(ok.validate().is_ok());
        assert_eq!(ok.correct_answer(), Some("b"));

        let out_of_range = QuestionDraft::new("Q?", vec!["a".into(), "b".into()], 2);
        assert!(out_of_range.validate().is_err());

        let blank = QuestionDraft::new("  ", vec!["a".into()], 0);
        assert!(blank.validate().is_err());
    }
}
