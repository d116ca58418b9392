//! Application state for the HTTP server.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::db::repository::CoordRepository;
use crate::services::{FsTempStorage, TrackIngestor};
use crate::tracks::GpxParser;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn CoordRepository>,
    /// Upload parsing and merging
    pub ingestor: TrackIngestor,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn CoordRepository>,
        ingestor: TrackIngestor,
        config: ServerConfig,
    ) -> Self {
        Self {
            repository,
            ingestor,
            config: Arc::new(config),
        }
    }

    /// State with the GPX parser and filesystem temp storage under
    /// `config.temp_dir`.
    pub fn from_config(repository: Arc<dyn CoordRepository>, config: ServerConfig) -> Self {
        let storage = FsTempStorage::new(config.temp_dir.clone());
        let ingestor = TrackIngestor::new(Arc::new(GpxParser::new()), Arc::new(storage));
        Self::new(repository, ingestor, config)
    }
}
