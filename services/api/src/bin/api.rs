//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GeminiVideoAdapter, OpenAiQuestionAdapter, YouTubeTranscriptAdapter},
    config::{Config, ConfigError, ContentSourceKind},
    error::ApiError,
    web::{app_router, rest::ApiDoc, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::http::{
    header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE},
    HeaderValue, Method,
};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tube_quiz_core::{pipeline::QuizPipeline, ports::ContentSource};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use yt_transcript_rs::api::YouTubeTranscriptApi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Initialize Service Adapters ---
    let openai_config = OpenAIConfig::new().with_api_key(
        config
            .openai_api_key
            .as_ref()
            .ok_or_else(|| ApiError::Config(ConfigError::MissingVar("OPENAI_API_KEY".to_string())))?,
    );
    let openai_client = Client::with_config(openai_config);
    let question_adapter = Arc::new(OpenAiQuestionAdapter::new(
        openai_client,
        config.question_model.clone(),
    ));

    let content_adapter: Arc<dyn ContentSource> = match config.content_source {
        ContentSourceKind::Transcript => {
            let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| {
                ApiError::Internal(format!("Failed to initialise the captions client: {}", e))
            })?;
            info!(
                "Using YouTube captions as content source (languages: {}).",
                config.transcript_languages.join(", ")
            );
            Arc::new(YouTubeTranscriptAdapter::new(
                api,
                config.transcript_languages.clone(),
            ))
        }
        ContentSourceKind::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| ApiError::Config(ConfigError::MissingVar("GEMINI_API_KEY".to_string())))?;
            info!("Using {} as content source.", config.gemini_model);
            Arc::new(GeminiVideoAdapter::new(
                reqwest::Client::new(),
                api_key,
                config.gemini_model.clone(),
            ))
        }
    };

    // --- 3. Build the Shared AppState ---
    let pipeline = QuizPipeline::new(content_adapter, question_adapter)
        .with_min_content_chars(config.min_content_chars);

    if !config.template_path.exists() {
        warn!(
            "Default template {} not found; every request will have to upload one.",
            config.template_path.display()
        );
    }
    tokio::fs::create_dir_all(&config.output_dir).await?;

    let app_state = Arc::new(AppState {
        config: config.clone(),
        pipeline: Arc::new(pipeline),
    });

    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ApiError::Config(ConfigError::InvalidValue(
            "ALLOWED_ORIGIN".to_string(),
            e.to_string(),
        ))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT])
        .expose_headers([CONTENT_DISPOSITION]);

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(app_router(app_state).layer(cors))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
