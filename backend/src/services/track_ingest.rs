//! Track upload ingestion.
//!
//! Reads stored uploads, parses them in upload order, merges and decimates
//! the result, and always schedules removal of the temporary files, whether
//! or not the merge succeeded.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::temp_storage::{spawn_cleanup, CleanupReport, StoredUpload, TempStorage};
use crate::db::repository::{CoordRepository, RepositoryResult};
use crate::db::services as db_services;
use crate::tracks::{
    build_merged_track, render_persistence_statements, JunctureId, MergedTrack, TrackError,
    TrackParser, TrackResult, MAX_TRACK_FILES,
};

/// Error type for the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Track(#[from] TrackError),

    #[error("Temporary storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(String),
}

/// Result of an ingestion together with its cleanup task.
#[derive(Debug)]
pub struct IngestOutcome {
    pub result: Result<MergedTrack, IngestError>,
    /// Background deletion of the uploads. Dropping it does not cancel it.
    pub cleanup: JoinHandle<CleanupReport>,
}

/// Parses uploads and builds merged tracks.
#[derive(Clone)]
pub struct TrackIngestor {
    parser: Arc<dyn TrackParser>,
    storage: Arc<dyn TempStorage>,
}

impl TrackIngestor {
    pub fn new(parser: Arc<dyn TrackParser>, storage: Arc<dyn TempStorage>) -> Self {
        Self { parser, storage }
    }

    pub fn storage(&self) -> &Arc<dyn TempStorage> {
        &self.storage
    }

    /// Merge stored uploads into one decimated track for `juncture_id`.
    ///
    /// Every upload is handed to the cleanup task once parsing is over,
    /// including when parsing fails part way.
    pub async fn ingest(&self, uploads: Vec<StoredUpload>, juncture_id: JunctureId) -> IngestOutcome {
        let result = self.merge_uploads(&uploads, juncture_id).await;
        if let Err(e) = &result {
            warn!(juncture = %juncture_id, error = %e, "track ingestion failed");
        }

        let cleanup = spawn_cleanup(Arc::clone(&self.storage), uploads);
        IngestOutcome { result, cleanup }
    }

    async fn merge_uploads(
        &self,
        uploads: &[StoredUpload],
        juncture_id: JunctureId,
    ) -> Result<MergedTrack, IngestError> {
        validate_upload_count(uploads.len())?;
        info!(files = uploads.len(), juncture = %juncture_id, "merging track uploads");

        let mut contents = Vec::with_capacity(uploads.len());
        for upload in uploads {
            let bytes = self.storage.read(upload).await?;
            contents.push((upload.name.clone(), bytes));
        }

        let parser = Arc::clone(&self.parser);
        let track = tokio::task::spawn_blocking(move || -> TrackResult<MergedTrack> {
            let files = contents
                .iter()
                .map(|(name, bytes)| parser.parse_file(name, bytes))
                .collect::<TrackResult<Vec<_>>>()?;
            build_merged_track(files, juncture_id)
        })
        .await
        .map_err(|e| IngestError::Join(e.to_string()))??;

        info!(
            juncture = %juncture_id,
            points = track.len(),
            "merged track ready"
        );
        Ok(track)
    }
}

/// Reject empty or oversized upload sets.
pub fn validate_upload_count(count: usize) -> TrackResult<()> {
    if count == 0 {
        return Err(TrackError::validation("No track files supplied"));
    }
    if count > MAX_TRACK_FILES {
        return Err(TrackError::validation(format!(
            "At most {} track files can be uploaded, got {}",
            MAX_TRACK_FILES, count
        )));
    }
    Ok(())
}

/// Replace the stored coordinates of a juncture with `track`.
///
/// Returns the number of inserted rows. Repository errors are returned as-is.
pub async fn persist_track(
    repo: &dyn CoordRepository,
    track: &MergedTrack,
) -> RepositoryResult<usize> {
    let batch = render_persistence_statements(track);
    let inserted = db_services::store_batch(repo, &batch).await?;
    info!(juncture = %track.juncture_id, rows = inserted, "persisted track");
    Ok(inserted)
}
