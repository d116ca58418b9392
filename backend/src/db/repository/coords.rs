//! Repository trait for persisted track coordinates.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::db::models::StoredCoord;
use crate::tracks::{JunctureId, StatementBatch};

/// Storage for the coordinates of each juncture.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to be shared across handlers.
#[async_trait]
pub trait CoordRepository: Send + Sync {
    /// Check if the store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if connection is healthy
    /// - `Ok(false)` if connection is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if an error occurred during the check
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Execute a delete-then-insert batch atomically.
    ///
    /// Either every statement takes effect or none does.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of inserted rows
    /// * `Err(RepositoryError)` - If any statement fails; nothing is committed
    async fn execute_batch(&self, batch: &StatementBatch) -> RepositoryResult<usize>;

    /// Fetch the stored coordinates of a juncture, ordered by time.
    ///
    /// Rows sharing a timestamp keep their insertion order. An unknown
    /// juncture yields an empty list.
    async fn fetch_coords(&self, juncture_id: JunctureId) -> RepositoryResult<Vec<StoredCoord>>;
}
