//! Question management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{
    AnswerOption, MessageResponse, Question, QuestionCreateRequest, QuestionKind, QuestionStatus,
    QuestionUpdateRequest,
};

/// GET /api/documents/:id/questions - List questions for a document
pub async fn list_for_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<Question>>> {
    state.require_document(&document_id)?;
    Ok(Json(
        state.database().list_questions_by_document(&document_id)?,
    ))
}

/// GET /api/questions/:id - Get a question
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Question>> {
    state
        .database()
        .get_question(&id)?
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("Question {} not found", id)))
}

/// POST /api/questions - Create a question manually
pub async fn create_question(
    State(state): State<AppState>,
    Json(request): Json<QuestionCreateRequest>,
) -> Result<Json<Question>> {
    if request.prompt.trim().is_empty() {
        return Err(Error::validation("Question text cannot be empty"));
    }
    if request.correct_answer.trim().is_empty() {
        return Err(Error::validation("Correct answer cannot be empty"));
    }
    if request.kind == QuestionKind::MultipleChoice && request.options.len() < 2 {
        return Err(Error::validation(
            "Multiple choice questions need at least 2 options",
        ));
    }

    state.require_document(&request.document_id)?;

    let now = chrono::Utc::now();
    let question = Question {
        id: Uuid::new_v4(),
        document_id: request.document_id,
        prompt: request.prompt,
        kind: request.kind,
        difficulty: request.difficulty,
        topic: request.topic,
        correct_answer: request.correct_answer.clone(),
        explanation: request.explanation,
        options: build_options(&request.options, &request.correct_answer),
        source_context: None,
        generation_model: None,
        status: QuestionStatus::Draft,
        created_at: now,
        updated_at: now,
    };

    state.database().insert_question(&question)?;
    Ok(Json(question))
}

/// PUT /api/questions/:id - Edit a question
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuestionUpdateRequest>,
) -> Result<Json<Question>> {
    let mut question = state
        .database()
        .get_question(&id)?
        .ok_or_else(|| Error::not_found(format!("Question {} not found", id)))?;

    if let Some(prompt) = request.prompt {
        if prompt.trim().is_empty() {
            return Err(Error::validation("Question text cannot be empty"));
        }
        question.prompt = prompt;
    }
    if let Some(difficulty) = request.difficulty {
        question.difficulty = difficulty;
    }
    if let Some(topic) = request.topic {
        question.topic = Some(topic);
    }
    if let Some(correct_answer) = request.correct_answer {
        if correct_answer.trim().is_empty() {
            return Err(Error::validation("Correct answer cannot be empty"));
        }
        question.correct_answer = correct_answer;
    }
    if let Some(explanation) = request.explanation {
        question.explanation = Some(explanation);
    }
    if let Some(status) = request.status {
        question.status = status;
    }
    if let Some(options) = request.options {
        if question.kind == QuestionKind::MultipleChoice && options.len() < 2 {
            return Err(Error::validation(
                "Multiple choice questions need at least 2 options",
            ));
        }
        question.options = build_options(&options, &question.correct_answer);
    } else {
        // Re-mark correctness when only the answer text changed
        let correct = question.correct_answer.clone();
        for option in &mut question.options {
            option.is_correct = option.content == correct;
        }
    }

    question.updated_at = chrono::Utc::now();
    state.database().update_question(&question)?;
    Ok(Json(question))
}

/// POST /api/questions/:id/approve - Approve a draft question
pub async fn approve_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Question>> {
    let mut question = state
        .database()
        .get_question(&id)?
        .ok_or_else(|| Error::not_found(format!("Question {} not found", id)))?;

    question.status = QuestionStatus::Approved;
    question.updated_at = chrono::Utc::now();
    state.database().update_question(&question)?;
    Ok(Json(question))
}

/// DELETE /api/questions/:id - Delete a question
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    if !state.database().delete_question(&id)? {
        return Err(Error::not_found(format!("Question {} not found", id)));
    }
    Ok(Json(MessageResponse::new("Question deleted successfully")))
}

fn build_options(options: &[String], correct_answer: &str) -> Vec<AnswerOption> {
    options
        .iter()
        .map(|opt| AnswerOption::new(opt.clone(), opt == correct_answer))
        .collect()
}
