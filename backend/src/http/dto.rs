//! Data Transfer Objects for the HTTP API.
//!
//! The track payloads themselves come from [`crate::api`]; this module only
//! adds the request/response envelopes used by the handlers.

use serde::{Deserialize, Serialize};

pub use crate::api::{StoredCoord, TrackFeature};

/// Multipart field name carrying the uploaded track files.
pub const UPLOAD_FIELD: &str = "uploads[]";

/// Response of `POST /api/process-gpx`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessGpxResponse {
    pub data: GpxData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpxData {
    #[serde(rename = "geoJSON")]
    pub geo_json: TrackFeature,
}

impl From<TrackFeature> for ProcessGpxResponse {
    fn from(geo_json: TrackFeature) -> Self {
        Self {
            data: GpxData { geo_json },
        }
    }
}

/// Query string of `POST /api/process-gpx`. The juncture is optional since
/// the preview is not stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProcessGpxQuery {
    pub juncture: Option<i64>,
}

/// Query string of `POST /api/process-gpx/upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadQuery {
    pub juncture: i64,
}

/// Response of `POST /api/process-gpx/upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub response: String,
}

impl UploadResponse {
    pub fn uploaded(rows: usize) -> Self {
        Self {
            response: format!("Uploaded {} coord pairs to server", rows),
        }
    }
}

/// Response of `GET /api/junctures/{juncture_id}/coords`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordsResponse {
    pub juncture_id: i64,
    pub total: usize,
    pub coords: Vec<StoredCoord>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Crate version
    pub version: String,
    /// Database connection status
    pub database: String,
}
