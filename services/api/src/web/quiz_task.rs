//! services/api/src/web/quiz_task.rs
//!
//! This module contains the "worker" function for one quiz generation run:
//! content fetch, question generation and package assembly, in that order.

use crate::web::state::AppState;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tube_quiz_core::{
    assemble_package, write_package_atomically, QuestionDraft, QuizError, QuizRequest,
};
use uuid::Uuid;

const OUTPUT_PREFIX: &str = "quiz-from-youtube-";
const OUTPUT_EXTENSION: &str = ".h5p";
const OUTPUT_SUFFIX_LEN: usize = 8;

/// The result of a successful run.
#[derive(Debug, Clone)]
pub struct QuizOutcome {
    pub file_name: String,
    pub drafts: Vec<QuestionDraft>,
    pub content_chars: usize,
    pub generated_at: DateTime<Utc>,
}

/// A fresh random package file name, e.g. `quiz-from-youtube-3f9a0c1e.h5p`.
pub fn new_output_name() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}{}",
        OUTPUT_PREFIX,
        &suffix[..OUTPUT_SUFFIX_LEN],
        OUTPUT_EXTENSION
    )
}

/// Whether `name` could have come from [`new_output_name`]. Anything else,
/// including path separators, is refused before touching the filesystem.
pub fn is_output_name(name: &str) -> bool {
    name.strip_prefix(OUTPUT_PREFIX)
        .and_then(|rest| rest.strip_suffix(OUTPUT_EXTENSION))
        .is_some_and(|suffix| {
            suffix.len() == OUTPUT_SUFFIX_LEN
                && suffix
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        })
}

/// Runs one generation end to end.
///
/// `uploaded_template` replaces the configured default template when present.
/// The package only appears in the output directory once it is complete.
pub async fn quiz_process(
    app_state: Arc<AppState>,
    request: QuizRequest,
    uploaded_template: Option<Bytes>,
) -> Result<QuizOutcome, QuizError> {
    info!(
        "Generating {} {} questions for video {}.",
        request.question_count, request.language, request.video
    );

    let prepared = app_state.pipeline.prepare(&request).await?;

    let config = &app_state.config;
    let template = match uploaded_template {
        Some(bytes) => bytes,
        None => tokio::fs::read(&config.template_path)
            .await
            .map(Bytes::from)
            .map_err(|e| {
                QuizError::InvalidTemplate(format!(
                    "no template was uploaded and the default template {} could not be read: {}",
                    config.template_path.display(),
                    e
                ))
            })?,
    };

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| {
            QuizError::PackagingFailed(format!(
                "cannot create output directory {}: {}",
                config.output_dir.display(),
                e
            ))
        })?;

    let file_name = new_output_name();
    let output_path: PathBuf = config.output_dir.join(&file_name);
    let drafts = prepared.drafts.clone();
    tokio::task::spawn_blocking(move || {
        let package = assemble_package(&template, &drafts)?;
        write_package_atomically(&output_path, &package)
    })
    .await
    .map_err(|e| QuizError::PackagingFailed(format!("assembly task failed: {}", e)))??;

    info!("Quiz package {} is ready.", file_name);
    Ok(QuizOutcome {
        file_name,
        drafts: prepared.drafts,
        content_chars: prepared.content_chars,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_are_accepted() {
        for _ in 0..20 {
            let name = new_output_name();
            assert!(is_output_name(&name), "{name}");
        }
    }

    #[test]
    fn generated_names_differ() {
        assert_ne!(new_output_name(), new_output_name());
    }

    #[test]
    fn foreign_names_are_refused() {
        for name in [
            "quiz-from-youtube-3f9a0c1e.zip",
            "quiz-from-youtube-3F9A0C1E.h5p",
            "quiz-from-youtube-3f9a0c1.h5p",
            "quiz-from-youtube-../../etc.h5p",
            "../quiz-from-youtube-3f9a0c1e.h5p",
            "template.h5p",
        ] {
            assert!(!is_output_name(name), "{name}");
        }
        assert!(is_output_name("quiz-from-youtube-3f9a0c1e.h5p"));
    }
}
