//! Document upload and management endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::content::TextExtractor;
use crate::error::{Error, Result};
use crate::server::state::{AppState, UploadDisposition};
use crate::types::{
    Document, DocumentStatus, FileType, MessageResponse, RenameRequest, UploadResponse,
};

/// POST /api/documents - Upload a document
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Internal(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Internal(format!("Failed to read file: {}", e)))?;

        upload = Some((filename, data.to_vec()));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| Error::validation("No file provided"))?;

    if data.is_empty() {
        return Err(Error::validation("Uploaded file is empty"));
    }

    let file_type = FileType::from_filename(&filename);
    if !file_type.is_supported() {
        let ext = filename.rsplit('.').next().unwrap_or("").to_string();
        return Err(Error::UnsupportedFileType(ext));
    }

    tracing::info!("Processing upload: {} ({} bytes)", filename, data.len());

    // Extraction is CPU-bound, keep it off the runtime threads
    let extract_filename = filename.clone();
    let extract_data = data.clone();
    let extracted = tokio::task::spawn_blocking(move || {
        TextExtractor::extract(&extract_filename, &extract_data)
    })
    .await
    .map_err(|e| Error::Internal(format!("Extraction task failed: {}", e)))??;

    match state.check_upload(&filename, &extracted.content_hash)? {
        UploadDisposition::Unchanged(existing) => {
            tracing::info!("Skipped upload of '{}': unchanged", filename);
            Ok(Json(UploadResponse {
                document: existing,
                deduplicated: true,
                note: Some(format!(
                    "unchanged (hash: {}...)",
                    &extracted.content_hash[..12]
                )),
            }))
        }
        UploadDisposition::Duplicate(existing) => {
            tracing::info!(
                "Skipped upload of '{}': duplicate of '{}'",
                filename,
                existing.filename
            );
            let note = format!("duplicate of '{}'", existing.filename);
            Ok(Json(UploadResponse {
                document: existing,
                deduplicated: true,
                note: Some(note),
            }))
        }
        UploadDisposition::Modified(mut existing) => {
            tracing::info!("File '{}' modified, replacing content", filename);

            existing.file_type = extracted.file_type.clone();
            existing.content_hash = extracted.content_hash.clone();
            existing.file_size = data.len() as u64;
            existing.text_length = extracted.content.len();
            existing.total_pages = extracted.total_pages;
            existing.updated_at = chrono::Utc::now();

            store_files(&state, &mut existing, &data, &extracted.content).await?;
            state.database().update_document(&existing)?;

            Ok(Json(UploadResponse {
                document: existing,
                deduplicated: false,
                note: Some("replaced previous content".to_string()),
            }))
        }
        UploadDisposition::New => {
            let mut doc = Document::new(
                filename.clone(),
                extracted.file_type.clone(),
                extracted.content_hash.clone(),
                data.len() as u64,
            );
            doc.text_length = extracted.content.len();
            doc.total_pages = extracted.total_pages;

            state.database().insert_document(&doc)?;

            if let Err(e) = store_files(&state, &mut doc, &data, &extracted.content).await {
                state
                    .database()
                    .update_document_status(&doc.id, DocumentStatus::Failed)?;
                return Err(e);
            }

            doc.status = DocumentStatus::Ready;
            state.database().update_document(&doc)?;

            tracing::info!(
                "Ingested '{}': {} chars extracted, {} pages",
                filename,
                doc.text_length,
                doc.total_pages.unwrap_or(1)
            );

            Ok(Json(UploadResponse {
                document: doc,
                deduplicated: false,
                note: None,
            }))
        }
    }
}

/// Write blob and extracted content, recording the URIs on the document
async fn store_files(
    state: &AppState,
    doc: &mut Document,
    data: &[u8],
    content: &str,
) -> Result<()> {
    let storage_uri = state.store().store_blob(&doc.id, &doc.file_type, data).await?;
    let content_uri = state.store().store_content(&doc.id, content).await?;
    doc.storage_uri = Some(storage_uri);
    doc.content_uri = Some(content_uri);
    Ok(())
}

/// GET /api/documents - List all documents
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<Document>>> {
    Ok(Json(state.database().list_documents()?))
}

/// GET /api/documents/:id - Get document details
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>> {
    Ok(Json(state.require_document(&id)?))
}

/// DELETE /api/documents/:id - Delete a document
///
/// Fails with a conflict while a generation job references it.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    let doc = state.delete_document(&id).await?;
    Ok(Json(MessageResponse::new(format!(
        "Document '{}' deleted",
        doc.filename
    ))))
}

/// PUT /api/documents/:id/rename - Rename a document
pub async fn rename_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<Document>> {
    let new_filename = request.new_filename.trim();
    if new_filename.is_empty() {
        return Err(Error::validation("Filename cannot be empty"));
    }

    state.require_document(&id)?;
    state.database().rename_document(&id, new_filename)?;
    Ok(Json(state.require_document(&id)?))
}
