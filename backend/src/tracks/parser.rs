//! Track-exchange format adapters.
//!
//! The engine only needs `(coordinates, timestamps)` out of a file, so the
//! format is hidden behind [`TrackParser`]. [`GpxParser`] is the production
//! implementation.

use std::io::Cursor;

use chrono::{DateTime, Utc};

use super::error::{TrackError, TrackResult};
use super::{Coordinate, RawTrack, TrackFile};

/// Capability to turn raw file bytes into a coordinate/timestamp pair.
pub trait TrackParser: Send + Sync {
    /// Parse `bytes` read from the upload named `name`.
    ///
    /// # Errors
    /// * `TrackError::Parse` if the bytes are not a valid document.
    fn parse(&self, name: &str, bytes: &[u8]) -> TrackResult<RawTrack>;

    /// Parse and pair the result into a [`TrackFile`].
    fn parse_file(&self, name: &str, bytes: &[u8]) -> TrackResult<TrackFile> {
        let raw = self.parse(name, bytes)?;
        TrackFile::from_raw(name, raw)
    }
}

/// GPX 1.0/1.1 parser.
///
/// Only the first `<trk>` of a document is read; its segments are
/// concatenated in document order. Waypoints and routes are ignored. A
/// point without `<time>` contributes a coordinate but no timestamp, which
/// [`TrackFile::from_raw`] then rejects.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpxParser;

impl GpxParser {
    pub fn new() -> Self {
        Self
    }
}

impl TrackParser for GpxParser {
    fn parse(&self, name: &str, bytes: &[u8]) -> TrackResult<RawTrack> {
        let document = gpx::read(Cursor::new(bytes)).map_err(|e| TrackError::parse(name, e))?;

        let Some(track) = document.tracks.first() else {
            return Ok(RawTrack::default());
        };

        let mut raw = RawTrack::default();
        for (index, waypoint) in track
            .segments
            .iter()
            .flat_map(|segment| segment.points.iter())
            .enumerate()
        {
            let point = waypoint.point();
            let coordinate = Coordinate {
                longitude: point.x(),
                latitude: point.y(),
                elevation: waypoint.elevation,
            };
            ensure_finite(name, index, &coordinate)?;
            raw.coordinates.push(coordinate);

            if let Some(time) = &waypoint.time {
                let formatted = time.format().map_err(|e| TrackError::parse(name, e))?;
                raw.timestamps.push(parse_timestamp(name, &formatted)?);
            }
        }

        Ok(raw)
    }
}

/// NaN and infinities have no SQL or JSON number form.
fn ensure_finite(name: &str, index: usize, coordinate: &Coordinate) -> TrackResult<()> {
    let finite = coordinate.longitude.is_finite()
        && coordinate.latitude.is_finite()
        && coordinate.elevation.map_or(true, f64::is_finite);
    if finite {
        Ok(())
    } else {
        Err(TrackError::parse(
            name,
            format!("point {} has a non-finite coordinate", index),
        ))
    }
}

fn parse_timestamp(name: &str, value: &str) -> TrackResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| TrackError::parse(name, format!("invalid time '{}': {}", value, e)))
}
