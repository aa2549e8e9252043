use api_lib::{
    config::Config,
    web::{app_router, state::AppState},
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use tube_quiz_core::{
    ContentSource, PortResult, QuestionDraft, QuestionGenerator, QuizLanguage, QuizPipeline,
    VideoReference, CONTENT_DESCRIPTOR_PATH,
};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

const BOUNDARY: &str = "quiz-test-boundary";
const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

//=========================================================================================
// Fakes
//=========================================================================================

struct FixedContent(String);

#[async_trait]
impl ContentSource for FixedContent {
    async fn fetch_content(&self, _video: &VideoReference) -> PortResult<String> {
        Ok(self.0.clone())
    }
}

/// Answers with exactly as many drafts as were asked for.
struct CountingGenerator;

#[async_trait]
impl QuestionGenerator for CountingGenerator {
    async fn generate_questions(
        &self,
        _text: &str,
        count: u32,
        _language: QuizLanguage,
    ) -> PortResult<Vec<QuestionDraft>> {
        Ok((0..count as usize)
            .map(|n| {
                QuestionDraft::new(
                    format!("Vraag {}?", n + 1),
                    vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    n % 4,
                )
            })
            .collect())
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

fn template_with(questions: Value) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("h5p.json", FileOptions::default()).unwrap();
    zip.write_all(br#"{"mainLibrary":"H5P.QuestionSet"}"#).unwrap();
    zip.start_file(CONTENT_DESCRIPTOR_PATH, FileOptions::default())
        .unwrap();
    let content = json!({"questions": questions, "passPercentage": 50});
    zip.write_all(content.to_string().as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn usable_template() -> Vec<u8> {
    template_with(json!([{
        "library": "H5P.MultiChoice 1.16",
        "params": {"question": "Q?", "answers": [{"text": "A", "correct": true}]},
        "metadata": {"title": "T"},
        "subContentId": "orig"
    }]))
}

struct TestApp {
    router: Router,
    dir: TempDir,
}

fn test_app(content: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let template_path = dir.path().join("quiz-template.h5p");
    std::fs::write(&template_path, usable_template()).unwrap();

    let vars: HashMap<&str, String> = HashMap::from([
        ("TEMPLATE_PATH", template_path.display().to_string()),
        ("OUTPUT_DIR", dir.path().join("out").display().to_string()),
        ("MIN_CONTENT_CHARS", "20".to_string()),
    ]);
    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();

    let pipeline = QuizPipeline::new(
        Arc::new(FixedContent(content.to_string())),
        Arc::new(CountingGenerator),
    )
    .with_min_content_chars(config.min_content_chars);
    let state = Arc::new(AppState {
        config: Arc::new(config),
        pipeline: Arc::new(pipeline),
    });

    TestApp {
        router: app_router(state),
        dir,
    }
}

const LONG_CONTENT: &str = "Photosynthesis turns light into chemical energy in plants.";

fn multipart_body(text_fields: &[(&str, &str)], template: Option<&[u8]>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = template {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"template\"; filename=\"custom.h5p\"\r\nContent-Type: application/zip\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn post_quiz(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/quizzes")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

fn descriptor_questions(package: &[u8]) -> Vec<Value> {
    let mut zip = ZipArchive::new(Cursor::new(package)).unwrap();
    let mut entry = zip.by_name(CONTENT_DESCRIPTOR_PATH).unwrap();
    let mut text = String::new();
    entry.read_to_string(&mut text).unwrap();
    let content: Value = serde_json::from_str(&text).unwrap();
    content["questions"].as_array().unwrap().clone()
}

fn output_files(dir: &Path) -> Vec<String> {
    match std::fs::read_dir(dir.join("out")) {
        Ok(entries) => entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn generates_and_serves_a_package() {
    let app = test_app(LONG_CONTENT);
    let body = multipart_body(
        &[
            ("video_url", VIDEO_URL),
            ("question_count", "3"),
            ("language", "en"),
        ],
        None,
    );

    let (status, bytes) = send(&app.router, post_quiz(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&bytes));
    let response: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(response["question_count"], 3);
    assert_eq!(response["questions"][0]["title"], "Question 1");
    assert_eq!(response["questions"][1]["correct_label"], "B");
    let file_name = response["file_name"].as_str().unwrap().to_string();
    assert_eq!(response["download_url"], format!("/quizzes/{file_name}"));

    let response = app
        .router
        .clone()
        .oneshot(get(&format!("/quizzes/{file_name}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/zip"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains(&file_name));
    let package = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    let questions = descriptor_questions(&package);
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[2]["params"]["question"], "Vraag 3?");
    assert_eq!(questions[2]["metadata"]["title"], "Question 3");
}

#[tokio::test]
async fn defaults_to_five_questions() {
    let app = test_app(LONG_CONTENT);
    let body = multipart_body(&[("video_url", "dQw4w9WgXcQ")], None);

    let (status, bytes) = send(&app.router, post_quiz(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let response: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(response["question_count"], 5);
}

#[tokio::test]
async fn uploaded_template_replaces_the_default() {
    let app = test_app(LONG_CONTENT);
    let custom = template_with(json!([{
        "library": "H5P.MultiChoice 1.16",
        "params": {"question": "Q?", "answers": [{"text": "A", "correct": false, "tip": "custom"}]},
        "subContentId": "custom"
    }]));
    let body = multipart_body(
        &[("video_url", VIDEO_URL), ("question_count", "1")],
        Some(&custom),
    );

    let (status, bytes) = send(&app.router, post_quiz(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    let response: Value = serde_json::from_slice(&bytes).unwrap();
    let file_name = response["file_name"].as_str().unwrap();

    let package = std::fs::read(app.dir.path().join("out").join(file_name)).unwrap();
    let questions = descriptor_questions(&package);
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0]["params"]["answers"][0]["tip"], "custom");
}

#[tokio::test]
async fn missing_video_url_is_a_bad_request() {
    let app = test_app(LONG_CONTENT);
    let body = multipart_body(&[("question_count", "3")], None);

    let (status, _) = send(&app.router, post_quiz(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn out_of_range_count_is_a_bad_request() {
    let app = test_app(LONG_CONTENT);
    for count in ["0", "31", "three"] {
        let body = multipart_body(&[("video_url", VIDEO_URL), ("question_count", count)], None);
        let (status, _) = send(&app.router, post_quiz(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "count {count}");
    }
}

#[tokio::test]
async fn unusable_template_is_unprocessable() {
    let app = test_app(LONG_CONTENT);
    let empty = template_with(json!([]));
    let body = multipart_body(&[("video_url", VIDEO_URL)], Some(&empty));

    let (status, _) = send(&app.router, post_quiz(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(output_files(app.dir.path()).is_empty());
}

#[tokio::test]
async fn short_content_is_a_bad_gateway() {
    let app = test_app("Too short.");
    let body = multipart_body(&[("video_url", VIDEO_URL)], None);

    let (status, bytes) = send(&app.router, post_quiz(body)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(String::from_utf8_lossy(&bytes).contains("Too short."));
    assert!(output_files(app.dir.path()).is_empty());
}

#[tokio::test]
async fn download_refuses_foreign_names() {
    let app = test_app(LONG_CONTENT);

    let (status, _) = send(&app.router, get("/quizzes/quiz-template.h5p")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app.router, get("/quizzes/quiz-from-youtube-0123abcd.h5p")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
