//! Flashcard management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{Flashcard, FlashcardCreateRequest, FlashcardUpdateRequest, MessageResponse};

/// GET /api/documents/:id/flashcards - List flashcards for a document
pub async fn list_for_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<Flashcard>>> {
    state.require_document(&document_id)?;
    Ok(Json(
        state.database().list_flashcards_by_document(&document_id)?,
    ))
}

/// POST /api/flashcards - Create a flashcard manually
pub async fn create_flashcard(
    State(state): State<AppState>,
    Json(request): Json<FlashcardCreateRequest>,
) -> Result<Json<Flashcard>> {
    if request.front.trim().is_empty() || request.back.trim().is_empty() {
        return Err(Error::validation("Flashcards need both a front and a back"));
    }

    state.require_document(&request.document_id)?;

    let card = Flashcard {
        id: Uuid::new_v4(),
        document_id: request.document_id,
        card_type: request.card_type,
        front: request.front,
        back: request.back,
        explanation: request.explanation,
        topic: request.topic,
        generation_model: None,
        created_at: chrono::Utc::now(),
    };

    state.database().insert_flashcard(&card)?;
    Ok(Json(card))
}

/// PUT /api/flashcards/:id - Edit a flashcard
pub async fn update_flashcard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<FlashcardUpdateRequest>,
) -> Result<Json<Flashcard>> {
    let mut card = state
        .database()
        .get_flashcard(&id)?
        .ok_or_else(|| Error::not_found(format!("Flashcard {} not found", id)))?;

    if let Some(card_type) = request.card_type {
        card.card_type = card_type;
    }
    if let Some(front) = request.front {
        if front.trim().is_empty() {
            return Err(Error::validation("Flashcard front cannot be empty"));
        }
        card.front = front;
    }
    if let Some(back) = request.back {
        if back.trim().is_empty() {
            return Err(Error::validation("Flashcard back cannot be empty"));
        }
        card.back = back;
    }
    if let Some(explanation) = request.explanation {
        card.explanation = Some(explanation);
    }
    if let Some(topic) = request.topic {
        card.topic = Some(topic);
    }

    state.database().update_flashcard(&card)?;
    Ok(Json(card))
}

/// DELETE /api/flashcards/:id - Delete a flashcard
pub async fn delete_flashcard(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    if !state.database().delete_flashcard(&id)? {
        return Err(Error::not_found(format!("Flashcard {} not found", id)));
    }
    Ok(Json(MessageResponse::new("Flashcard deleted successfully")))
}
