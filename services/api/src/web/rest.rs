//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::{
    quiz_task::{is_output_name, quiz_process, QuizOutcome},
    state::AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, warn};
use tube_quiz_core::{
    domain::{QuizLanguage, QuizRequest, RequestError, VideoReference, DEFAULT_QUESTION_COUNT},
    package::question_label,
    preview::{answer_label, render_preview},
    QuizError,
};
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_quiz_handler,
        download_quiz_handler,
    ),
    components(
        schemas(CreateQuizResponse, QuestionPreview, AnswerPreview)
    ),
    tags(
        (name = "Tube Quiz API", description = "Turns a YouTube video into an H5P multiple-choice quiz.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after a quiz package has been generated.
#[derive(Serialize, ToSchema)]
pub struct CreateQuizResponse {
    file_name: String,
    download_url: String,
    question_count: usize,
    /// Length, in characters, of the text the questions were written from.
    content_chars: usize,
    questions: Vec<QuestionPreview>,
    /// The same questions as plain text.
    preview: String,
    generated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct QuestionPreview {
    title: String,
    question: String,
    answers: Vec<AnswerPreview>,
    correct_label: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnswerPreview {
    label: String,
    text: String,
    correct: bool,
}

impl From<QuizOutcome> for CreateQuizResponse {
    fn from(outcome: QuizOutcome) -> Self {
        let questions = outcome
            .drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| QuestionPreview {
                title: question_label(i + 1),
                question: draft.question_text.clone(),
                answers: draft
                    .answer_texts
                    .iter()
                    .enumerate()
                    .map(|(idx, text)| AnswerPreview {
                        label: answer_label(idx),
                        text: text.clone(),
                        correct: idx == draft.correct_index,
                    })
                    .collect(),
                correct_label: answer_label(draft.correct_index),
            })
            .collect();

        Self {
            download_url: format!("/quizzes/{}", outcome.file_name),
            question_count: outcome.drafts.len(),
            preview: render_preview(&outcome.drafts),
            file_name: outcome.file_name,
            content_chars: outcome.content_chars,
            questions,
            generated_at: outcome.generated_at,
        }
    }
}

/// The fields of the generation form.
struct QuizForm {
    video_url: String,
    question_count: u32,
    language: QuizLanguage,
    template: Option<Bytes>,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// The HTTP status reported for each kind of failed run.
pub fn quiz_error_status(err: &QuizError) -> StatusCode {
    match err {
        QuizError::ContentUnavailable { .. } | QuizError::GenerationUnavailable(_) => {
            StatusCode::BAD_GATEWAY
        }
        QuizError::InvalidTemplate(_) => StatusCode::UNPROCESSABLE_ENTITY,
        QuizError::PackagingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn bad_request(message: impl Into<String>) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message.into())
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Generate a quiz package from a YouTube video.
///
/// Accepts a multipart/form-data request with the fields `video_url` (required),
/// `question_count` (1-30, default 5), `language` (name or ISO code, default Dutch)
/// and an optional `template` file replacing the server's default template.
#[utoipa::path(
    post,
    path = "/quizzes",
    request_body(content_type = "multipart/form-data", description = "Video URL, question count, language and optional H5P template."),
    responses(
        (status = 201, description = "Quiz package generated", body = CreateQuizResponse),
        (status = 400, description = "Bad request (e.g., missing or invalid field)"),
        (status = 422, description = "The template package is unusable"),
        (status = 502, description = "No usable content or questions could be obtained"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let form = read_quiz_form(multipart).await?;

    let video = VideoReference::parse(&form.video_url).map_err(|e| bad_request(e.to_string()))?;
    let request = QuizRequest::new(video, form.question_count, form.language)
        .map_err(|e| bad_request(e.to_string()))?;

    match quiz_process(app_state, request, form.template).await {
        Ok(outcome) => Ok((StatusCode::CREATED, Json(CreateQuizResponse::from(outcome)))),
        Err(e) => {
            error!("Quiz generation failed: {:?}", e);
            Err((quiz_error_status(&e), e.to_string()))
        }
    }
}

async fn read_quiz_form(mut multipart: Multipart) -> Result<QuizForm, (StatusCode, String)> {
    let mut video_url = None;
    let mut question_count = DEFAULT_QUESTION_COUNT;
    let mut language = QuizLanguage::default();
    let mut template = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "video_url" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read video_url: {}", e)))?;
                video_url = Some(text);
            }
            "question_count" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read question_count: {}", e)))?;
                question_count = text.trim().parse().map_err(|_| {
                    bad_request(format!("question_count must be a whole number, got '{}'", text))
                })?;
            }
            "language" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read language: {}", e)))?;
                language = text
                    .parse()
                    .map_err(|e: RequestError| bad_request(e.to_string()))?;
            }
            "template" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(format!("Failed to read template bytes: {}", e)))?;
                // Browsers send an empty part when no file was chosen.
                if !data.is_empty() {
                    template = Some(data);
                }
            }
            other => warn!("Ignoring unknown form field '{}'.", other),
        }
    }

    let video_url = video_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| bad_request("Multipart form must include a video_url"))?;

    Ok(QuizForm {
        video_url,
        question_count,
        language,
        template,
    })
}

/// Download a generated quiz package.
#[utoipa::path(
    get,
    path = "/quizzes/{file_name}",
    responses(
        (status = 200, description = "The H5P package, served as application/zip"),
        (status = 400, description = "Not a generated package name"),
        (status = 404, description = "No such package")
    ),
    params(
        ("file_name" = String, Path, description = "File name returned by POST /quizzes.")
    )
)]
pub async fn download_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !is_output_name(&file_name) {
        return Err(bad_request(format!("'{}' is not a quiz package name", file_name)));
    }

    let path = app_state.config.output_dir.join(&file_name);
    let data = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            (StatusCode::NOT_FOUND, format!("No quiz package named '{}'", file_name))
        } else {
            error!("Failed to read {}: {:?}", path.display(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read quiz package".to_string(),
            )
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        data,
    ))
}
