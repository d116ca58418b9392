//! In-memory local repository implementation.
//!
//! Suitable for unit testing and local development. Batches are applied to a
//! staged copy of the data and swapped in on `COMMIT`, so a failing statement
//! leaves the stored rows untouched, just like a rolled back transaction.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::models::{violated_constraint, StoredCoord};
use crate::db::repository::{CoordRepository, ErrorContext, RepositoryError, RepositoryResult};
use crate::tracks::{JunctureId, Statement, StatementBatch};

/// In-memory local repository.
///
/// # Example
/// ```
/// use pomb_backend::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::new();
/// assert_eq!(repo.coord_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    coords: HashMap<JunctureId, Vec<StoredCoord>>,
    committed_batches: usize,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            coords: HashMap::new(),
            committed_batches: 0,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.coords.clear();
        data.committed_batches = 0;
    }

    /// Total number of stored rows across all junctures.
    pub fn coord_count(&self) -> usize {
        self.data.read().coords.values().map(Vec::len).sum()
    }

    /// Number of batches that committed successfully.
    pub fn committed_batches(&self) -> usize {
        self.data.read().committed_batches
    }

    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

#[async_trait]
impl CoordRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn execute_batch(&self, batch: &StatementBatch) -> RepositoryResult<usize> {
        self.check_health()?;

        let mut data = self.data.write();
        let mut staged: Option<HashMap<JunctureId, Vec<StoredCoord>>> = None;
        let mut inserted = 0usize;

        for (index, statement) in batch.statements().enumerate() {
            let context = || {
                ErrorContext::new("execute_batch")
                    .with_juncture(batch.juncture_id())
                    .with_statement(index)
            };

            match statement {
                Statement::Begin => {
                    if staged.is_some() {
                        return Err(RepositoryError::transaction_with_context(
                            "Transaction already open",
                            context(),
                        ));
                    }
                    staged = Some(data.coords.clone());
                }
                Statement::DeleteJuncture(juncture_id) => {
                    let rows = staged.as_mut().ok_or_else(|| no_transaction(context()))?;
                    rows.remove(&juncture_id);
                }
                Statement::Insert(row) => {
                    let rows = staged.as_mut().ok_or_else(|| no_transaction(context()))?;
                    if let Some(constraint) = violated_constraint(row) {
                        return Err(RepositoryError::query_with_context(
                            format!(
                                "new row for relation \"coords\" violates check constraint \"{}\"",
                                constraint
                            ),
                            context(),
                        ));
                    }
                    rows.entry(row.juncture_id)
                        .or_default()
                        .push(StoredCoord::from(row));
                    inserted += 1;
                }
                Statement::Commit => {
                    let rows = staged.take().ok_or_else(|| no_transaction(context()))?;
                    data.coords = rows;
                    data.committed_batches += 1;
                }
            }
        }

        Ok(inserted)
    }

    async fn fetch_coords(&self, juncture_id: JunctureId) -> RepositoryResult<Vec<StoredCoord>> {
        self.check_health()?;

        let mut rows = self
            .data
            .read()
            .coords
            .get(&juncture_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|row| row.coord_time);
        Ok(rows)
    }
}

fn no_transaction(context: ErrorContext) -> RepositoryError {
    RepositoryError::transaction_with_context("Statement outside of a transaction", context)
}
