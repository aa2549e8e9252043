//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Level;
use tube_quiz_core::pipeline::DEFAULT_MIN_CONTENT_CHARS;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where the text a quiz is generated from comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentSourceKind {
    /// The video's own captions.
    Transcript,
    /// A Gemini model watching the video and describing it.
    Gemini,
}

impl FromStr for ContentSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transcript" | "captions" => Ok(Self::Transcript),
            "gemini" => Ok(Self::Gemini),
            other => Err(format!(
                "'{}' is not a content source (expected 'transcript' or 'gemini')",
                other
            )),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub allowed_origin: String,
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub content_source: ContentSourceKind,
    pub question_model: String,
    pub gemini_model: String,
    pub transcript_languages: Vec<String>,
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub min_content_chars: usize,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Load Server Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var_or("BIND_ADDRESS", "0.0.0.0:3000"))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = var_or("ALLOWED_ORIGIN", "http://localhost:3000");

        // --- Load API Keys (as optional) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        let gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        // --- Load Adapter-specific Settings ---
        let content_source: ContentSourceKind =
            parse_var("CONTENT_SOURCE", &var_or("CONTENT_SOURCE", "transcript"))?;
        if content_source == ContentSourceKind::Gemini && gemini_api_key.is_none() {
            return Err(ConfigError::MissingVar("GEMINI_API_KEY".to_string()));
        }
        let question_model = var_or("QUESTION_MODEL", "gpt-4.1-mini");
        let gemini_model = var_or("GEMINI_MODEL", "gemini-2.5-flash");
        let transcript_languages: Vec<String> = var_or("TRANSCRIPT_LANGUAGES", "nl,en")
            .split(',')
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
            .collect();
        if transcript_languages.is_empty() {
            return Err(ConfigError::InvalidValue(
                "TRANSCRIPT_LANGUAGES".to_string(),
                "at least one language code is required".to_string(),
            ));
        }

        // --- Load Package Settings ---
        let template_path = PathBuf::from(var_or("TEMPLATE_PATH", "./quiz-template.h5p"));
        let output_dir = PathBuf::from(var_or("OUTPUT_DIR", "./generated"));
        let min_content_chars = parse_var(
            "MIN_CONTENT_CHARS",
            &var_or("MIN_CONTENT_CHARS", &DEFAULT_MIN_CONTENT_CHARS.to_string()),
        )?;
        let max_upload_bytes =
            parse_var("MAX_UPLOAD_BYTES", &var_or("MAX_UPLOAD_BYTES", "10485760"))?;

        Ok(Self {
            bind_address,
            log_level,
            allowed_origin,
            openai_api_key,
            gemini_api_key,
            content_source,
            question_model,
            gemini_model,
            transcript_languages,
            template_path,
            output_dir,
            min_content_chars,
            max_upload_bytes,
        })
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}
