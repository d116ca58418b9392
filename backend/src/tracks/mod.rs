//! Track merge and decimation engine.
//!
//! Turns a set of uploaded track files into one chronologically placed,
//! down-sampled point sequence and renders it into a transactional batch of
//! persistence statements.
//!
//! ```text
//! bytes ──► TrackParser ──► RawTrack ──► TrackFile ─┐
//! bytes ──► TrackParser ──► RawTrack ──► TrackFile ─┼─► merge_tracks ─► decimate ─► MergedTrack
//!                                                   ┘                                  │
//!                                             render_persistence_statements ◄──────────┘
//! ```
//!
//! Everything in this module is synchronous and free of I/O. Temporary file
//! handling and statement execution live in [`crate::services`] and
//! [`crate::db`] respectively.

pub mod decimate;
pub mod error;
pub mod merge;
pub mod parser;
pub mod statements;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use decimate::{decimate, DECIMATION_STRIDE};
pub use error::{TrackError, TrackResult};
pub use merge::{merge_tracks, place_block};
pub use parser::{GpxParser, TrackParser};
pub use statements::{render_persistence_statements, CoordInsert, Statement, StatementBatch};

/// Maximum number of track files accepted in one merge.
pub const MAX_TRACK_FILES: usize = 5;

/// Juncture identifier (a leg of a trip, database key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct JunctureId(pub i64);

impl JunctureId {
    pub fn new(value: i64) -> Self {
        JunctureId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for JunctureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A `(longitude, latitude, elevation)` triple as produced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: Option<f64>,
}

/// One sample along a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl TrackPoint {
    pub fn new(coordinate: Coordinate, timestamp: DateTime<Utc>) -> Self {
        Self {
            longitude: coordinate.longitude,
            latitude: coordinate.latitude,
            elevation: coordinate.elevation,
            timestamp,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            longitude: self.longitude,
            latitude: self.latitude,
            elevation: self.elevation,
        }
    }
}

/// Parser output: parallel coordinate and timestamp sequences.
///
/// The two sequences are only trusted once [`TrackFile::from_raw`] has checked
/// that they line up; past that point the engine works on paired records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTrack {
    pub coordinates: Vec<Coordinate>,
    pub timestamps: Vec<DateTime<Utc>>,
}

/// One uploaded track, points in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFile {
    pub name: String,
    pub points: Vec<TrackPoint>,
}

impl TrackFile {
    pub fn new(name: impl Into<String>, points: Vec<TrackPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    /// Pair up a parser result into track points.
    ///
    /// # Errors
    /// * `TrackError::Validation` if the coordinate and timestamp counts differ.
    pub fn from_raw(name: impl Into<String>, raw: RawTrack) -> TrackResult<Self> {
        let name = name.into();
        if raw.coordinates.len() != raw.timestamps.len() {
            return Err(TrackError::Validation(format!(
                "{}: {} coordinates but {} timestamps",
                name,
                raw.coordinates.len(),
                raw.timestamps.len()
            )));
        }

        let points = raw
            .coordinates
            .into_iter()
            .zip(raw.timestamps)
            .map(|(coordinate, timestamp)| TrackPoint::new(coordinate, timestamp))
            .collect();

        Ok(Self { name, points })
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The per-request merge result bound to its juncture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTrack {
    pub juncture_id: JunctureId,
    pub points: Vec<TrackPoint>,
}

impl MergedTrack {
    pub fn new(juncture_id: JunctureId, points: Vec<TrackPoint>) -> Self {
        Self {
            juncture_id,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Merge, then decimate, a set of already parsed files.
///
/// # Errors
/// * `TrackError::Validation` for zero files, too many files or an empty file.
pub fn build_merged_track(
    files: Vec<TrackFile>,
    juncture_id: JunctureId,
) -> TrackResult<MergedTrack> {
    if files.len() > MAX_TRACK_FILES {
        return Err(TrackError::Validation(format!(
            "At most {} track files can be merged, got {}",
            MAX_TRACK_FILES,
            files.len()
        )));
    }

    let merged = merge_tracks(files)?;
    Ok(MergedTrack::new(juncture_id, decimate(merged)))
}
