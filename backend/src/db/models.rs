//! Shared data models for database layer consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tracks::{CoordInsert, JunctureId};

/// Inclusive latitude range accepted by the coordinates table.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
/// Inclusive longitude range accepted by the coordinates table.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// A persisted coordinate row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredCoord {
    pub juncture_id: JunctureId,
    pub lat: f64,
    pub lon: f64,
    pub elevation: Option<f64>,
    pub coord_time: DateTime<Utc>,
}

impl From<&CoordInsert> for StoredCoord {
    fn from(row: &CoordInsert) -> Self {
        Self {
            juncture_id: row.juncture_id,
            lat: row.lat,
            lon: row.lon,
            elevation: row.elevation,
            coord_time: row.coord_time,
        }
    }
}

/// Check a row against the table's range constraints.
///
/// Returns the name of the violated constraint, if any.
pub fn violated_constraint(row: &CoordInsert) -> Option<&'static str> {
    let within = |v: f64, (lo, hi): (f64, f64)| v >= lo && v <= hi;
    if !within(row.lat, LATITUDE_RANGE) {
        Some("coords_lat_range")
    } else if !within(row.lon, LONGITUDE_RANGE) {
        Some("coords_lon_range")
    } else {
        None
    }
}
