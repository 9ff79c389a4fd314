//! API routes for the question generation server

pub mod documents;
pub mod flashcards;
pub mod jobs;
pub mod questions;
pub mod summary;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Documents - upload gets a larger body limit
        .route(
            "/documents",
            get(documents::list_documents)
                .post(documents::upload_document)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/:id/rename", put(documents::rename_document))
        // Generation and jobs
        .route("/generate", post(jobs::generate))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/:id", get(jobs::get_job))
        // Questions
        .route("/documents/:id/questions", get(questions::list_for_document))
        .route("/questions", post(questions::create_question))
        .route(
            "/questions/:id",
            get(questions::get_question)
                .put(questions::update_question)
                .delete(questions::delete_question),
        )
        .route("/questions/:id/approve", post(questions::approve_question))
        // Flashcards
        .route(
            "/documents/:id/flashcards",
            get(flashcards::list_for_document),
        )
        .route("/flashcards", post(flashcards::create_flashcard))
        .route(
            "/flashcards/:id",
            put(flashcards::update_flashcard).delete(flashcards::delete_flashcard),
        )
        // Summaries
        .route(
            "/documents/:id/summary",
            get(summary::get_summary).post(summary::generate_summary),
        )
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "labquiz",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Question generation service for lab documents",
        "endpoints": {
            "POST /api/documents": "Upload a document (multipart)",
            "GET /api/documents": "List all documents",
            "GET /api/documents/:id": "Get document details",
            "DELETE /api/documents/:id": "Delete a document (409 while a job runs)",
            "PUT /api/documents/:id/rename": "Rename a document",
            "POST /api/generate": "Queue question/flashcard generation",
            "GET /api/jobs": "List all jobs and queue stats",
            "GET /api/jobs/:id": "Get job progress",
            "GET /api/documents/:id/questions": "List questions for a document",
            "POST /api/questions": "Create a question manually",
            "GET/PUT/DELETE /api/questions/:id": "Read, edit, or delete a question",
            "POST /api/questions/:id/approve": "Approve a draft question",
            "GET /api/documents/:id/flashcards": "List flashcards for a document",
            "POST /api/flashcards": "Create a flashcard manually",
            "PUT/DELETE /api/flashcards/:id": "Edit or delete a flashcard",
            "POST /api/documents/:id/summary": "Generate a study summary",
            "GET /api/documents/:id/summary": "Get the stored summary"
        },
        "features": {
            "deduplication": "Content-hash based upload deduplication",
            "async_generation": "Generation runs as background jobs with polling",
            "difficulty_tagging": "Generated questions carry difficulty levels",
            "drafts": "Generated questions start as drafts and can be approved"
        }
    }))
}
