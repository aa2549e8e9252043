//! services/api/src/adapters/questions_llm.rs
//!
//! This module contains the adapter for the question-writing LLM.
//! It implements the `QuestionGenerator` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str =
    "You write instructive multiple-choice questions and always answer with valid JSON.";

const USER_INPUT_TEMPLATE: &str = r#"You are given the text of a video (a transcript of its audio, or a description of its content).
Write {count} multiple-choice questions in {language} about its content.

Rules:
- Audience: adult learners.
- Every question:
  - 1 clear question sentence.
  - 4 answer options.
  - Exactly one correct answer.
- Ask about the substance, not about trivial details or isolated words.
- Write EVERYTHING in {language} (both the questions and the answers).

Return ONLY valid JSON in this format:

{
  "questions": [
    {
      "question": "question text",
      "answers": ["answer A", "answer B", "answer C", "answer D"],
      "correct_index": 0
    }
  ]
}

Text of the video:
"""{text}""""#;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client, error::OpenAIError,
};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;
use tube_quiz_core::{
    domain::{QuestionDraft, QuizLanguage},
    ports::{PortError, PortResult, QuestionGenerator},
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuestionGenerator` using an OpenAI chat model in JSON mode.
#[derive(Clone)]
pub struct OpenAiQuestionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQuestionAdapter {
    /// Creates a new `OpenAiQuestionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Fills the prompt template. The video text goes in last so that braces inside
/// it are never mistaken for placeholders.
fn build_user_input(text: &str, count: u32, language: QuizLanguage) -> String {
    USER_INPUT_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{language}", language.name())
        .replace("{text}", text)
}

//=========================================================================================
// Response Parsing
//=========================================================================================

#[derive(Deserialize)]
struct QuestionsPayload {
    #[serde(default)]
    questions: Vec<QuestionPayload>,
}

#[derive(Deserialize)]
struct QuestionPayload {
    question: String,
    answers: Vec<String>,
    correct_index: usize,
}

/// Parses the model's JSON answer. A missing `questions` field yields an empty list.
fn parse_questions(raw: &str) -> PortResult<Vec<QuestionDraft>> {
    let body = strip_code_fence(raw);
    let payload: QuestionsPayload = serde_json::from_str(body).map_err(|e| {
        PortError::GenerationUnavailable(format!(
            "the model did not answer with valid question JSON ({}): {}",
            e,
            raw.trim()
        ))
    })?;
    Ok(payload
        .questions
        .into_iter()
        .map(|q| QuestionDraft::new(q.question, q.answers, q.correct_index))
        .collect())
}

/// Removes a surrounding Markdown code fence, which some models add even in JSON mode.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
    {
        Some(inner) => inner.trim(),
        None => trimmed,
    }
}

//=========================================================================================
// `QuestionGenerator` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestionGenerator for OpenAiQuestionAdapter {
    /// Asks the model for `count` questions about `text`, written in `language`.
    async fn generate_questions(
        &self,
        text: &str,
        count: u32,
        language: QuizLanguage,
    ) -> PortResult<Vec<QuestionDraft>> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(build_user_input(text, count, language))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        info!("Requesting {} questions in {} from {}.", count, language, self.model);

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::GenerationUnavailable(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::GenerationUnavailable(
                    "Question generation LLM response contained no text content.".to_string(),
                )
            })?;

        parse_questions(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_count_and_language_and_embeds_text() {
        let input = build_user_input("Water boils at {count} degrees.", 7, QuizLanguage::German);
        assert!(input.contains("Write 7 multiple-choice questions in German"));
        assert!(input.contains("Write EVERYTHING in German"));
        assert!(input.contains("\"\"\"Water boils at {count} degrees.\"\"\""));
    }

    #[test]
    fn parses_well_formed_response() {
        let raw = r#"{"questions": [
            {"question": "What is 2+2?", "answers": ["3", "4", "5", "6"], "correct_index": 1},
            {"question": "Yes?", "answers": ["yes", "no"], "correct_index": 0}
        ]}"#;
        let drafts = parse_questions(raw).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].question_text, "What is 2+2?");
        assert_eq!(drafts[0].correct_answer(), Some("4"));
        assert_eq!(drafts[1].answer_texts.len(), 2);
    }

    #[test]
    fn missing_questions_field_is_empty() {
        assert!(parse_questions(r#"{"quiz": []}"#).unwrap().is_empty());
    }

    #[test]
    fn tolerates_code_fences() {
        let raw = "```json\n{\"questions\": [{\"question\": \"Q?\", \"answers\": [\"a\"], \"correct_index\": 0}]}\n```";
        assert_eq!(parse_questions(raw).unwrap().len(), 1);
    }

    #[test]
    fn unparsable_response_is_generation_unavailable() {
        for raw in [
            "I'm sorry, I can't help with that.",
            r#"{"questions": [{"question": "Q?", "answers": "a, b", "correct_index": 0}]}"#,
            r#"{"questions": [{"question": "Q?", "answers": ["a"], "correct_index": -1}]}"#,
        ] {
            let err = parse_questions(raw).unwrap_err();
            assert!(matches!(err, PortError::GenerationUnavailable(_)), "raw: {raw}");
        }
    }
}
