pub mod quiz_task;
pub mod rest;
pub mod state;

use axum::{extract::DefaultBodyLimit, routing::{get, post}, Router};
use std::sync::Arc;

pub use quiz_task::quiz_process;
pub use rest::{create_quiz_handler, download_quiz_handler};
pub use state::AppState;

/// Builds the API routes over the shared state. CORS and the Swagger UI are
/// layered on by the server binary.
pub fn app_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/quizzes", post(create_quiz_handler))
        .route("/quizzes/{file_name}", get(download_quiz_handler))
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .with_state(app_state)
}
