pub mod gemini;
pub mod questions_llm;
pub mod transcript;

pub use gemini::GeminiVideoAdapter;
pub use questions_llm::OpenAiQuestionAdapter;
pub use transcript::YouTubeTranscriptAdapter;
