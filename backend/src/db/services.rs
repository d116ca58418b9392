//! Repository-agnostic service functions.
//!
//! Handlers call these instead of the repository trait directly so that
//! logging and error context stay in one place.

use log::{debug, info};

use super::models::StoredCoord;
use super::repository::{CoordRepository, RepositoryResult};
use crate::tracks::{JunctureId, StatementBatch};

/// Check that the configured store is reachable.
pub async fn health_check(repo: &dyn CoordRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Execute a rendered persistence batch and return the inserted row count.
pub async fn store_batch(
    repo: &dyn CoordRepository,
    batch: &StatementBatch,
) -> RepositoryResult<usize> {
    debug!(
        "executing {} statements for juncture {}",
        batch.statement_count(),
        batch.juncture_id()
    );
    let inserted = repo
        .execute_batch(batch)
        .await
        .map_err(|e| e.with_operation("store_batch"))?;
    info!("stored {} coords for juncture {}", inserted, batch.juncture_id());
    Ok(inserted)
}

/// Fetch the stored coordinates of a juncture in time order.
pub async fn fetch_coords(
    repo: &dyn CoordRepository,
    juncture_id: JunctureId,
) -> RepositoryResult<Vec<StoredCoord>> {
    repo.fetch_coords(juncture_id).await
}
