//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the engine/repository layers:
//! they own the request-scoped I/O (temporary files, blocking parse work,
//! persistence calls) around the pure track engine.

pub mod temp_storage;
pub mod track_ingest;

pub use temp_storage::{
    spawn_cleanup, CleanupReport, FsTempStorage, StoredUpload, TempStorage, DEFAULT_TEMP_DIR,
};
pub use track_ingest::{persist_track, IngestError, IngestOutcome, TrackIngestor};
