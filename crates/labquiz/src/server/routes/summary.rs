//! Document summary endpoints
//!
//! Summaries are generated synchronously: one LLM call, small payload.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::server::state::AppState;
use crate::types::{DocumentStatus, DocumentSummary};

/// Characters of document text handed to the summary prompt
const SUMMARY_CONTEXT_CHARS: usize = 6_000;

/// POST /api/documents/:id/summary - Generate (or regenerate) a summary
pub async fn generate_summary(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentSummary>> {
    let doc = state.require_document(&document_id)?;
    if doc.status != DocumentStatus::Ready {
        return Err(Error::validation(format!(
            "Document '{}' is not ready (status: {})",
            doc.filename,
            doc.status.as_str()
        )));
    }

    let mut content = state.store().load_content(&doc.id).await?;
    if content.len() > SUMMARY_CONTEXT_CHARS {
        let mut end = SUMMARY_CONTEXT_CHARS;
        while end > 0 && !content.is_char_boundary(end) {
            end -= 1;
        }
        content.truncate(end);
        content.push_str("\n[Content truncated]");
    }

    let source_word_count = content.split_whitespace().count();
    let prompt = PromptBuilder::summary(&doc.filename, &content);

    let summary_text = state.llm().generate_prose(&prompt).await?;
    if summary_text.trim().is_empty() {
        return Err(Error::generation("Model returned an empty summary"));
    }

    let now = chrono::Utc::now();
    let summary = DocumentSummary {
        document_id: doc.id,
        summary_word_count: summary_text.split_whitespace().count(),
        content: summary_text,
        source_word_count,
        generation_model: state.llm().model().to_string(),
        created_at: now,
        updated_at: now,
    };

    state.database().upsert_summary(&summary)?;
    tracing::info!(
        "Generated summary for '{}' ({} words)",
        doc.filename,
        summary.summary_word_count
    );

    Ok(Json(summary))
}

/// GET /api/documents/:id/summary - Get the stored summary
pub async fn get_summary(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentSummary>> {
    state.require_document(&document_id)?;

    state
        .database()
        .get_summary(&document_id)?
        .map(Json)
        .ok_or_else(|| {
            Error::not_found(format!("No summary for document {}", document_id))
        })
}
