//! Document upload endpoint

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::retrieval::PendingDocument;
use crate::server::state::AppState;
use crate::types::{IngestError, IngestResponse, IngestedFile};

/// POST /api/upload - Upload and index files
///
/// Every multipart field with a filename is a document. Files fail
/// independently; the batch succeeds if any file was indexed.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<IngestResponse>)> {
    let start = Instant::now();
    let batch_id = Uuid::new_v4();
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::internal(format!("Failed to read multipart field: {}", e)))?
    {
        let filename = match field.file_name() {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => continue,
        };

        let data = field.bytes().await.map_err(|e| e.to_string());
        uploads.push((filename, data));
    }

    if uploads.is_empty() {
        return Err(Error::NoFiles);
    }

    tracing::info!("Upload {}: {} file(s)", batch_id, uploads.len());

    let mut errors = Vec::new();
    let mut pending = Vec::new();

    for (filename, data) in uploads {
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                errors.push(IngestError {
                    filename,
                    error: format!("Failed to read file: {}", e),
                });
                continue;
            }
        };

        tracing::info!("Processing file: {} ({} bytes)", filename, data.len());

        let pipeline = state.pipeline().clone();
        let name = filename.clone();
        let extracted = tokio::task::spawn_blocking(move || pipeline.ingest(&name, &data))
            .await
            .map_err(|e| Error::internal(format!("Extraction task failed: {}", e)))
            .and_then(|result| result);

        match extracted {
            Ok((_, chunks)) => pending.push(PendingDocument::new(filename, chunks)),
            Err(e) => {
                tracing::warn!("Failed to process {}: {}", filename, e);
                errors.push(IngestError {
                    filename,
                    error: e.to_string(),
                });
            }
        }
    }

    let names: Vec<String> = pending.iter().map(|d| d.source.clone()).collect();
    let outcomes = state.knowledge_base().ingest(pending).await?;

    let mut files = Vec::new();
    for (filename, outcome) in names.into_iter().zip(outcomes) {
        match outcome {
            Ok(chunks) => files.push(IngestedFile { filename, chunks }),
            Err(e) => {
                tracing::warn!("Failed to index {}: {}", filename, e);
                errors.push(IngestError {
                    filename,
                    error: e.to_string(),
                });
            }
        }
    }

    let response = IngestResponse::new(files, errors, start.elapsed().as_millis() as u64);
    tracing::info!("Upload {}: {}", batch_id, response.summary());

    let status = if response.success {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    Ok((status, Json(response)))
}
