//! Generation trigger and job progress endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{GenerateOptions, GenerationJob, JobProgress};
use crate::server::state::AppState;
use crate::types::{DocumentStatus, GenerateAccepted, GenerateRequest};

/// POST /api/generate - Queue a generation job for a document
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateAccepted>> {
    let limits = &state.config().generation;

    if let Some(topic) = &request.topic {
        if topic.trim().len() > limits.max_topic_chars {
            return Err(Error::validation(format!(
                "Topic must be {} characters or less",
                limits.max_topic_chars
            )));
        }
    }

    if request.question_count == 0 && request.flashcard_count == 0 {
        return Err(Error::validation(
            "Request at least one question or flashcard",
        ));
    }
    if request.question_count > limits.max_questions_per_request {
        return Err(Error::validation(format!(
            "Question count cannot exceed {}",
            limits.max_questions_per_request
        )));
    }
    if request.flashcard_count > limits.max_flashcards_per_request {
        return Err(Error::validation(format!(
            "Flashcard count cannot exceed {}",
            limits.max_flashcards_per_request
        )));
    }

    let doc = state.require_document(&request.document_id)?;
    if doc.status != DocumentStatus::Ready {
        return Err(Error::validation(format!(
            "Document '{}' is not ready for generation (status: {})",
            doc.filename,
            doc.status.as_str()
        )));
    }

    let topic = request
        .topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let job = GenerationJob::new(
        doc.id,
        GenerateOptions {
            topic,
            question_count: request.question_count,
            flashcard_count: request.flashcard_count,
            difficulty: request.difficulty,
        },
    );

    let job_id = state.job_queue().submit(job).await;

    Ok(Json(GenerateAccepted {
        job_id,
        document_id: doc.id,
        message: format!(
            "Job queued. Use /api/jobs/{} to check progress.",
            job_id
        ),
    }))
}

/// GET /api/jobs/:id - Get job progress
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResponse>> {
    let progress = state
        .job_queue()
        .get_progress(&job_id)
        .ok_or_else(|| Error::not_found(format!("Job {} not found", job_id)))?;

    Ok(Json(JobResponse::from(&progress)))
}

/// GET /api/jobs - List all jobs with queue stats
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    let jobs = state.job_queue().list_jobs();
    let stats = state.job_queue().stats();

    Json(JobListResponse {
        jobs: jobs.iter().map(JobResponse::from).collect(),
        total_jobs: stats.total_jobs,
        pending: stats.pending,
        running: stats.running,
        succeeded: stats.succeeded,
        failed: stats.failed,
    })
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub state: String,
    pub stage: String,
    pub topic: Option<String>,
    pub questions_requested: u32,
    pub flashcards_requested: u32,
    pub questions_generated: u32,
    pub flashcards_generated: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<&JobProgress> for JobResponse {
    fn from(p: &JobProgress) -> Self {
        Self {
            job_id: p.id,
            document_id: p.document_id,
            state: p.state.as_str().to_string(),
            stage: p.stage.as_str().to_string(),
            topic: p.topic.clone(),
            questions_requested: p.questions_requested,
            flashcards_requested: p.flashcards_requested,
            questions_generated: p.questions_generated,
            flashcards_generated: p.flashcards_generated,
            warnings: p.warnings.clone(),
            error: p.error.clone(),
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.to_rfc3339(),
            completed_at: p.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    pub total_jobs: usize,
    pub pending: usize,
    pub running: usize,
    pub succeeded: usize,
    pub failed: usize,
}
