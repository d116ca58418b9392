//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer for the actual work.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use tracing::{debug, info};

use super::dto::{
    CoordsResponse, HealthResponse, ProcessGpxQuery, ProcessGpxResponse, TrackFeature,
    UploadQuery, UploadResponse, UPLOAD_FIELD,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::services as db_services;
use crate::services::{persist_track, spawn_cleanup, StoredUpload};
use crate::tracks::{JunctureId, TrackError};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Track processing
// =============================================================================

/// POST /api/process-gpx
///
/// Merge up to five GPX uploads into one decimated track and return it as
/// GeoJSON. Nothing is persisted.
pub async fn process_gpx(
    State(state): State<AppState>,
    Query(query): Query<ProcessGpxQuery>,
    multipart: Multipart,
) -> HandlerResult<ProcessGpxResponse> {
    let juncture_id = JunctureId::new(query.juncture.unwrap_or_default());
    let uploads = receive_uploads(&state, multipart).await?;

    // The cleanup handle is detached; its report is logged by the task.
    let outcome = state.ingestor.ingest(uploads, juncture_id).await;
    let track = outcome.result?;

    Ok(Json(ProcessGpxResponse::from(TrackFeature::from(&track))))
}

/// Store every `uploads[]` part in temporary storage, in arrival order.
///
/// On failure the parts stored so far are handed to the cleanup task.
async fn receive_uploads(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<Vec<StoredUpload>, AppError> {
    let storage = Arc::clone(state.ingestor.storage());
    let limit = state.config.max_upload_files;
    let mut uploads = Vec::new();

    let result: Result<(), AppError> = async {
        while let Some(field) = multipart.next_field().await? {
            let field_name = field.name().unwrap_or_default().to_string();
            if field_name != UPLOAD_FIELD {
                return Err(AppError::BadRequest(format!(
                    "Unexpected field '{}', expected '{}'",
                    field_name, UPLOAD_FIELD
                )));
            }
            if uploads.len() >= limit {
                return Err(TrackError::validation(format!(
                    "At most {} track files can be uploaded",
                    limit
                ))
                .into());
            }

            let name = field
                .file_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("upload-{}", uploads.len() + 1));
            let bytes = field.bytes().await?;
            debug!(file = %name, bytes = bytes.len(), "received upload");

            let stored = storage
                .store(&name, &bytes)
                .await
                .map_err(|e| AppError::Internal(format!("Temporary storage error: {}", e)))?;
            uploads.push(stored);
        }
        Ok(())
    }
    .await;

    match result {
        Ok(()) => Ok(uploads),
        Err(e) => {
            spawn_cleanup(storage, uploads);
            Err(e)
        }
    }
}

/// POST /api/process-gpx/upload?juncture={id}
///
/// Replace the stored coordinates of a juncture with the posted feature.
pub async fn upload_track(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    Json(feature): Json<TrackFeature>,
) -> HandlerResult<UploadResponse> {
    let juncture_id = JunctureId::new(query.juncture);
    let track = feature.into_track(juncture_id)?;

    let rows = persist_track(state.repository.as_ref(), &track).await?;
    info!(juncture = %juncture_id, rows, "track uploaded");

    Ok(Json(UploadResponse::uploaded(rows)))
}

// =============================================================================
// Read-back
// =============================================================================

/// GET /api/junctures/{juncture_id}/coords
pub async fn get_juncture_coords(
    State(state): State<AppState>,
    Path(juncture_id): Path<i64>,
) -> HandlerResult<CoordsResponse> {
    let coords =
        db_services::fetch_coords(state.repository.as_ref(), JunctureId::new(juncture_id)).await?;

    Ok(Json(CoordsResponse {
        juncture_id,
        total: coords.len(),
        coords,
    }))
}
